use std::future::Future;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::info;

use crate::error::Result;
use crate::llm::client::ExtractionClient;
use crate::llm::prompts::{image_extraction_prompt, text_extraction_prompt};
use crate::llm::types::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};
use crate::llm::validate::parse_records;
use crate::record::ExpenseRecord;

/// Text extraction is bounded tighter than image extraction: image payloads
/// are larger and slower to process upstream.
const TEXT_TIMEOUT: Duration = Duration::from_secs(15);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(30);
const IMAGE_MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.1;

/// Extraction seam the service layer depends on, so tests can substitute a
/// canned extractor for the live inference backend.
pub trait RecordExtractor {
    fn extract_from_text(
        &self,
        text: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<ExpenseRecord>>> + Send;

    fn extract_from_image(
        &self,
        image_bytes: &[u8],
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<ExpenseRecord>>> + Send;
}

/// Drives one inference call per message and hands the raw completion to the
/// validator. `Ok(vec![])` means the model found nothing extractable; `Err`
/// means the backend itself was unreachable or misbehaving. Callers surface
/// the two differently.
pub struct ExpenseExtractor {
    client: ExtractionClient,
    model: String,
}

impl ExpenseExtractor {
    pub fn new(client: ExtractionClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl RecordExtractor for ExpenseExtractor {
    async fn extract_from_text(&self, text: &str, user_id: i64) -> Result<Vec<ExpenseRecord>> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(MessageContent::Text(
                text_extraction_prompt(text),
            ))],
            temperature: TEMPERATURE,
            max_tokens: None,
        };

        let content = self.client.chat(&request, TEXT_TIMEOUT).await?;
        let records = parse_records(&content, user_id);
        info!("LLM parsed {} expenses from input.", records.len());
        Ok(records)
    }

    async fn extract_from_image(
        &self,
        image_bytes: &[u8],
        user_id: i64,
    ) -> Result<Vec<ExpenseRecord>> {
        let data_uri = format!("data:image/jpeg;base64,{}", BASE64.encode(image_bytes));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::Text {
                    text: image_extraction_prompt(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_uri },
                },
            ]))],
            temperature: TEMPERATURE,
            max_tokens: Some(IMAGE_MAX_TOKENS),
        };

        let content = self.client.chat(&request, IMAGE_TIMEOUT).await?;
        let records = parse_records(&content, user_id);
        info!(
            "LLM parsed {} expenses from image for user {}.",
            records.len(),
            user_id
        );
        Ok(records)
    }
}
