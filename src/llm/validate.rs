//! Turns the model's raw text into validated [`ExpenseRecord`]s. The
//! upstream response is noisy and semi-structured: it may be wrapped in
//! markdown fencing, may not be JSON, may not be an array, and individual
//! elements may be malformed. Everything here degrades to "fewer records",
//! never to an error; one bad element must not discard the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{error, warn};
use serde_json::Value;

use crate::category::Category;
use crate::record::ExpenseRecord;

/// Fence markers recognized in model output, longest first so a json-tagged
/// fence is not consumed as a bare fence with a stray `json` prefix left
/// behind.
const FENCE_MARKERS: [&str; 2] = ["```json", "```"];
const FENCE_CLOSE: &str = "```";

/// Strips exactly one leading/trailing fence pair of a recognized marker,
/// otherwise returns the trimmed content unchanged. Content too short to
/// hold both markers (e.g. a lone ```` ``` ````) is left as-is, which keeps
/// the function total and idempotent.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    for marker in FENCE_MARKERS {
        if trimmed.starts_with(marker)
            && trimmed.ends_with(FENCE_CLOSE)
            && trimmed.len() >= marker.len() + FENCE_CLOSE.len()
        {
            return trimmed[marker.len()..trimmed.len() - FENCE_CLOSE.len()].trim();
        }
    }

    trimmed
}

/// Parses the extracted content as a list of candidate records and validates
/// each element independently. Output length is always ≤ the input array
/// length, and every returned record satisfies the `ExpenseRecord`
/// invariants.
pub fn parse_records(raw_content: &str, user_id: i64) -> Vec<ExpenseRecord> {
    if raw_content.trim().is_empty() {
        error!("LLM returned empty content");
        return Vec::new();
    }

    let content = strip_code_fence(raw_content);

    let parsed: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(_) => {
            error!("Failed to decode JSON from LLM response: {}", raw_content);
            return Vec::new();
        }
    };

    let Some(items) = parsed.as_array() else {
        warn!("Expected a list of expenses but got: {}", parsed);
        return Vec::new();
    };

    let now = Utc::now();
    items
        .iter()
        .filter_map(|item| validate_item(item, user_id, now))
        .collect()
}

/// Validates one candidate object. Amount coercion failure drops the
/// element; every other field falls back to its defined default.
fn validate_item(item: &Value, user_id: i64, now: DateTime<Utc>) -> Option<ExpenseRecord> {
    let amount = match coerce_amount(item.get("amount")) {
        Some(amount) => amount,
        None => {
            warn!("Skipping expense with invalid amount: {}", item);
            return None;
        }
    };

    let category = Category::normalize(item.get("category").and_then(Value::as_str));

    let description = item
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let timestamp = item
        .get("date")
        .and_then(Value::as_str)
        .and_then(parse_iso_timestamp)
        .unwrap_or(now);

    Some(ExpenseRecord {
        user_id,
        amount,
        category,
        description,
        timestamp,
    })
}

/// Coerces a JSON value to a positive amount. Accepts numbers and numeric
/// strings; the sign is not meaningful, so the absolute value is taken.
/// Zero and non-finite values cannot satisfy `amount > 0` and are rejected.
fn coerce_amount(value: Option<&Value>) -> Option<f64> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let amount = raw.abs();
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Accepts the ISO-8601 shapes the model actually produces: full RFC 3339,
/// a naive datetime with `T` or space separator, or a bare date (taken as
/// midnight UTC).
fn parse_iso_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}
