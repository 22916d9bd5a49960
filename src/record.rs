use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A single validated expense. Constructed only by the response validator;
/// once built it is append-only data, and the ledger writer never mutates a
/// record that has been written.
///
/// Invariants: `amount` is finite and strictly positive, `category` is a
/// member of the closed enumeration, `timestamp` is always a concrete
/// instant, and `description` is either absent or non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Identity of the submitting user on the chat platform.
    pub user_id: i64,
    pub amount: f64,
    pub category: Category,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Per-user durable configuration. Created lazily on first contact, updated
/// by the configure command, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub spreadsheet_id: Option<String>,
}
