//! # Expense Ledger Bot
//!
//! A library for turning free-text chat messages and receipt photos into
//! validated expense records (via one LLM inference call per message) and
//! appending them to a per-user monthly spreadsheet ledger.
//!
//! ## Core Concepts
//!
//! - **Extraction**: one chat-completions call per inbound message; the
//!   model is asked for a JSON array of candidate expenses
//! - **Validation**: the model's answer is noisy (fenced, sometimes not
//!   JSON, sometimes not an array); the validator strips, parses, and
//!   coerces per element, dropping bad elements without discarding the batch
//! - **Ledger**: an append-only spreadsheet partitioned into `MM-YYYY`
//!   sheets, with a canonical header row reconciled before every append
//! - **Stats block**: a reserved formula block (Total/Limit/Left) rewritten
//!   after each append and read back for the reply
//!
//! The chat transport itself (message delivery, command routing, file
//! download) is an external collaborator: it calls
//! [`ExpenseService::handle_text`], [`ExpenseService::handle_photo`] and
//! [`ExpenseService::configure_sheet`] and delivers whatever reply text
//! comes back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use expense_ledger_bot::{build_service, BotConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BotConfig::from_env()?;
//!     let service = build_service(&config)?;
//!
//!     let reply = service.handle_text(42, Some("Ada"), "Lunch 12.50").await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod llm;
pub mod record;
pub mod service;
pub mod sheets;
pub mod store;

pub use category::Category;
pub use config::BotConfig;
pub use error::{ExpenseBotError, Result};
pub use llm::{ExpenseExtractor, ExtractionClient, RecordExtractor};
pub use record::{ExpenseRecord, UserConfig};
pub use service::{extract_spreadsheet_id, ExpenseService};
pub use sheets::{
    LedgerWriter, MonthlyStats, ServiceAccountKey, SheetsClient, SpreadsheetBackend, TokenProvider,
};
pub use store::{SqliteUserStore, UserStore};

/// Wires the production pipeline from a validated [`BotConfig`]: service
/// account credentials are read once here, and every component receives its
/// collaborators by injection so tests can swap in fakes.
pub fn build_service(
    config: &BotConfig,
) -> Result<ExpenseService<ExpenseExtractor, SheetsClient, SqliteUserStore>> {
    let key = ServiceAccountKey::from_file(&config.credentials_path)?;
    let share_email = key.client_email.clone();

    let sheets = SheetsClient::new(TokenProvider::new(key));
    let ledger = LedgerWriter::new(sheets, config.monthly_limit);
    let extractor = ExpenseExtractor::new(ExtractionClient::new(config), config.model.clone());
    let users = SqliteUserStore::open(&config.database_path)?;

    Ok(ExpenseService::new(
        extractor,
        ledger,
        users,
        Some(share_email),
    ))
}
