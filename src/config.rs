use std::env;
use std::path::PathBuf;

use crate::error::{ExpenseBotError, Result};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-maverick:free";
pub const DEFAULT_MONTHLY_LIMIT: f64 = 1800.0;

const API_KEY_PLACEHOLDER: &str = "YOUR_OPENROUTER_API_KEY";

/// Environment-sourced configuration, validated once at the boundary.
/// A missing or placeholder API key is a startup error; it must not leak
/// into the pipeline and fail there on every message.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Sent as the `HTTP-Referer` header on inference calls.
    pub site_url: String,
    /// Sent as the `X-Title` header on inference calls.
    pub site_name: String,
    pub credentials_path: PathBuf,
    pub database_path: PathBuf,
    /// Monthly spending ceiling used by the stats block. Process-wide, not
    /// per-user.
    pub monthly_limit: f64,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENROUTER_API_KEY").unwrap_or_default();
        if !api_key_is_usable(&api_key) {
            return Err(ExpenseBotError::Config(
                "OPENROUTER_API_KEY is not set (or still the placeholder value)".to_string(),
            ));
        }

        let monthly_limit = match env::var("MONTHLY_LIMIT") {
            Ok(raw) => raw.trim().parse::<f64>().map_err(|_| {
                ExpenseBotError::Config(format!("MONTHLY_LIMIT '{}' is not a number", raw))
            })?,
            Err(_) => DEFAULT_MONTHLY_LIMIT,
        };

        Ok(Self {
            api_url: env_or("OPENROUTER_API_URL", DEFAULT_API_URL),
            api_key,
            model: env_or("LLM_MODEL", DEFAULT_MODEL),
            site_url: env_or("YOUR_SITE_URL", "http://localhost"),
            site_name: env_or("YOUR_SITE_NAME", "TelegramExpenseBot"),
            credentials_path: PathBuf::from(env_or(
                "GOOGLE_SERVICE_ACCOUNT_CREDENTIALS_PATH",
                "creds.json",
            )),
            database_path: PathBuf::from(env_or("DATABASE_PATH", "user_data.db")),
            monthly_limit,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn api_key_is_usable(key: &str) -> bool {
    !key.trim().is_empty() && key != API_KEY_PLACEHOLDER
}
