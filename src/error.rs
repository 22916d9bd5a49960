use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpenseBotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request to inference backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Inference backend returned status {status}: {body}")]
    InferenceApi {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Inference backend returned an empty completion")]
    EmptyCompletion,

    #[error("Spreadsheet '{0}' not found")]
    SpreadsheetNotFound(String),

    #[error("Access to spreadsheet '{0}' denied")]
    SpreadsheetAccessDenied(String),

    #[error("Spreadsheet backend returned status {status}: {body}")]
    SheetsApi {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Service account token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Spreadsheet backend reply was malformed: {0}")]
    MalformedReply(String),

    #[error("No expenses to write")]
    EmptyBatch,

    #[error("Stats block read returned {0} rows, expected 3")]
    StatsShape(usize),

    #[error("Stats value '{0}' is not numeric")]
    StatsValue(String),

    #[error("Stats refresh failed after append: {0}")]
    StatsRefresh(#[source] Box<ExpenseBotError>),

    #[error("Credential signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExpenseBotError>;
