pub mod auth;
pub mod client;
pub mod ledger;
pub mod stats;

pub use auth::{ServiceAccountKey, TokenProvider};
pub use client::{SheetProperties, SheetsClient, SpreadsheetBackend};
pub use ledger::{monthly_sheet_title, LedgerWriter, LEDGER_HEADERS};
pub use stats::{refresh_stats, MonthlyStats, STATS_READ_RANGE, STATS_WRITE_RANGE};
