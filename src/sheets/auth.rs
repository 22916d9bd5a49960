use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::error::{ExpenseBotError, Result};

const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Cached tokens are discarded this long before their actual expiry so an
/// in-flight request never carries a token that dies mid-call.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The subset of a Google service-account JSON key this crate needs.
/// `client_email` doubles as the address end users must grant edit access
/// to on their spreadsheet.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            error!(
                "Service account credentials file not found at {}: {}",
                path.display(),
                e
            );
            ExpenseBotError::Config(format!(
                "cannot read service account credentials at {}",
                path.display()
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a signed JWT-bearer assertion for an access token and caches
/// it process-wide until shortly before expiry. The credential itself is
/// read once at construction.
pub struct TokenProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            http: reqwest::Client::new(),
            key,
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn token(&self) -> Result<String> {
        {
            let guard = self
                .cached
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(cached) = guard.as_ref() {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.token.clone());
                }
            }
        }

        let assertion = self.sign_assertion()?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange returned {}: {}", status, body);
            return Err(ExpenseBotError::TokenExchange(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: TokenResponse = response.json().await?;
        let expires_at = Utc::now() + Duration::seconds(body.expires_in - EXPIRY_MARGIN_SECS);
        debug!("Obtained spreadsheet access token, valid until {}", expires_at);

        let mut guard = self
            .cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(CachedToken {
            token: body.access_token.clone(),
            expires_at,
        });

        Ok(body.access_token)
    }

    fn sign_assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &encoding_key,
        )?)
    }
}
