use std::time::Duration;

use log::error;
use reqwest::Client;

use crate::config::BotConfig;
use crate::error::{ExpenseBotError, Result};
use crate::llm::types::{ChatRequest, ChatResponse};

/// Thin client for the chat-completions endpoint. One request per call, no
/// retries; the caller decides what a failure degrades to.
#[derive(Clone)]
pub struct ExtractionClient {
    client: Client,
    api_url: String,
    api_key: String,
    site_url: String,
    site_name: String,
}

impl ExtractionClient {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
        }
    }

    /// Issues the inference call and returns the model's raw text. The
    /// timeout bounds the whole round-trip; image payloads get a longer one
    /// than text.
    pub async fn chat(&self, request: &ChatRequest, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .timeout(timeout)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Inference backend returned {}: {}", status, body);
            return Err(ExpenseBotError::InferenceApi { status, body });
        }

        let body: ChatResponse = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExpenseBotError::EmptyCompletion)
    }
}
