use std::fmt::Write as _;
use std::sync::OnceLock;

use log::{error, info, warn};
use regex::Regex;

use crate::error::ExpenseBotError;
use crate::llm::extractor::RecordExtractor;
use crate::record::ExpenseRecord;
use crate::sheets::client::SpreadsheetBackend;
use crate::sheets::ledger::LedgerWriter;
use crate::sheets::stats::MonthlyStats;
use crate::store::UserStore;

/// Pulls the id out of a full spreadsheet URL.
fn url_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("valid spreadsheet URL pattern")
    })
}

/// Accepts either a bare spreadsheet id or a full URL. Bare input must be a
/// single token over the id alphabet; anything else is rejected rather than
/// guessed at.
pub fn extract_spreadsheet_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(captures) = url_id_pattern().captures(trimmed) {
        return Some(captures[1].to_string());
    }

    trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .then(|| trimmed.to_string())
}

enum MessageSource {
    Text,
    Image,
}

/// Transport-facing core. One unit of work per inbound message: extract,
/// then write, sequentially. Every handler returns reply text; failures
/// below this layer arrive as `Result` values and are mapped to messages
/// here, never re-raised to the transport.
pub struct ExpenseService<E, B, S> {
    extractor: E,
    ledger: LedgerWriter<B>,
    users: S,
    /// Service-account address users must grant edit access to, when known.
    share_email: Option<String>,
}

impl<E, B, S> ExpenseService<E, B, S>
where
    E: RecordExtractor,
    B: SpreadsheetBackend,
    S: UserStore,
{
    pub fn new(
        extractor: E,
        ledger: LedgerWriter<B>,
        users: S,
        share_email: Option<String>,
    ) -> Self {
        Self {
            extractor,
            ledger,
            users,
            share_email,
        }
    }

    pub fn welcome(&self) -> String {
        "Hello! Send me your expense details or photos of receipts.".to_string()
    }

    pub async fn handle_text(
        &self,
        user_id: i64,
        display_name: Option<&str>,
        text: &str,
    ) -> String {
        info!("Text message from {}: {}", user_id, text);
        self.touch_user(user_id, display_name);

        let records = match self.extractor.extract_from_text(text, user_id).await {
            Ok(records) => records,
            Err(e) => {
                error!("Text extraction failed for user {}: {}", user_id, e);
                Vec::new()
            }
        };

        if records.is_empty() {
            return "❌ Error: Could not understand expense details from your message."
                .to_string();
        }

        self.write_and_reply(user_id, &records, MessageSource::Text)
            .await
    }

    pub async fn handle_photo(
        &self,
        user_id: i64,
        display_name: Option<&str>,
        image_bytes: &[u8],
    ) -> String {
        info!("Received photo message from {}", user_id);
        self.touch_user(user_id, display_name);

        let records = match self.extractor.extract_from_image(image_bytes, user_id).await {
            Ok(records) => records,
            Err(e) => {
                error!("Image extraction failed for user {}: {}", user_id, e);
                Vec::new()
            }
        };

        if records.is_empty() {
            return "❌ Error: Could not extract expenses from the image. Please ensure it's clear."
                .to_string();
        }

        self.write_and_reply(user_id, &records, MessageSource::Image)
            .await
    }

    pub fn configure_sheet(
        &self,
        user_id: i64,
        display_name: Option<&str>,
        raw_argument: &str,
    ) -> String {
        self.touch_user(user_id, display_name);

        let Some(spreadsheet_id) = extract_spreadsheet_id(raw_argument) else {
            return "❌ That doesn't look like a spreadsheet ID or URL. Send the ID itself or a link containing /spreadsheets/d/<id>.".to_string();
        };

        if let Err(e) = self.users.set_spreadsheet_id(user_id, &spreadsheet_id) {
            error!("Failed to store spreadsheet id for {}: {}", user_id, e);
            return "❌ Error: Could not save your spreadsheet configuration.".to_string();
        }

        info!("User {} configured spreadsheet '{}'", user_id, spreadsheet_id);
        match &self.share_email {
            Some(email) => format!(
                "✅ Spreadsheet configured. Grant edit access to {} so I can write to it.",
                email
            ),
            None => "✅ Spreadsheet configured.".to_string(),
        }
    }

    async fn write_and_reply(
        &self,
        user_id: i64,
        records: &[ExpenseRecord],
        source: MessageSource,
    ) -> String {
        let spreadsheet_id = match self.users.spreadsheet_id(user_id) {
            Ok(Some(id)) => id,
            Ok(None) => {
                return "❌ No Google Sheet configured. Use /setsheet with your spreadsheet ID or URL first.".to_string();
            }
            Err(e) => {
                error!("User store lookup failed for {}: {}", user_id, e);
                return "❌ Error: Could not load your configuration.".to_string();
            }
        };

        match self.ledger.append(records, &spreadsheet_id).await {
            Ok(stats) => success_reply(records, Some(&stats), source),
            Err(
                e @ (ExpenseBotError::SpreadsheetNotFound(_)
                | ExpenseBotError::SpreadsheetAccessDenied(_)),
            ) => {
                error!("Ledger precondition failed for user {}: {}", user_id, e);
                match &self.share_email {
                    Some(email) => format!(
                        "❌ Error: Could not open your Google Sheet. Check the spreadsheet ID and make sure {} has edit access.",
                        email
                    ),
                    None => "❌ Error: Could not open your Google Sheet. Please check the spreadsheet ID and sharing settings.".to_string(),
                }
            }
            Err(e) => {
                error!("Ledger write failed for user {}: {}", user_id, e);
                "❌ Error: Could not save expenses to Google Sheet. Please check configuration and sheet access.".to_string()
            }
        }
    }

    fn touch_user(&self, user_id: i64, display_name: Option<&str>) {
        if let Err(e) = self.users.ensure_user(user_id, display_name) {
            warn!("Could not record user {}: {}", user_id, e);
        }
    }
}

fn success_reply(
    records: &[ExpenseRecord],
    stats: Option<&MonthlyStats>,
    source: MessageSource,
) -> String {
    let mut details = String::new();
    for record in records {
        let _ = write!(details, "\n• {:.2} in '{}'", record.amount, record.category);
        if let Some(description) = &record.description {
            let _ = write!(details, " ({})", description);
        }
    }

    let origin = match source {
        MessageSource::Text => "",
        MessageSource::Image => " from the image",
    };

    let mut reply = format!(
        "✅ Added {} expense(s){} to Google Sheet:{}",
        records.len(),
        origin,
        details
    );
    if let Some(stats) = stats {
        let _ = write!(
            reply,
            "\n📊 Total: {:.2} | Limit: {:.2} | Left: {:.2}",
            stats.total, stats.limit, stats.left
        );
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_extract_id_from_url() {
        let url = "https://docs.google.com/spreadsheets/d/1AbC-deF_123/edit#gid=0";
        assert_eq!(extract_spreadsheet_id(url).as_deref(), Some("1AbC-deF_123"));
    }

    #[test]
    fn test_extract_id_from_bare_token() {
        assert_eq!(
            extract_spreadsheet_id("  1AbC-deF_123 ").as_deref(),
            Some("1AbC-deF_123")
        );
    }

    #[test]
    fn test_extract_id_rejects_garbage() {
        assert_eq!(extract_spreadsheet_id(""), None);
        assert_eq!(extract_spreadsheet_id("   "), None);
        assert_eq!(extract_spreadsheet_id("not a sheet link"), None);
        assert_eq!(extract_spreadsheet_id("https://example.com/other/path"), None);
    }

    #[test]
    fn test_success_reply_lists_records_and_stats() {
        let records = vec![
            ExpenseRecord {
                user_id: 1,
                amount: 12.5,
                category: Category::Food,
                description: Some("Lunch".to_string()),
                timestamp: Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
            },
            ExpenseRecord {
                user_id: 1,
                amount: 3.0,
                category: Category::Food,
                description: None,
                timestamp: Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
            },
        ];
        let stats = MonthlyStats {
            total: 45.0,
            limit: 1800.0,
            left: 1755.0,
        };

        let reply = success_reply(&records, Some(&stats), MessageSource::Text);
        assert!(reply.starts_with("✅ Added 2 expense(s) to Google Sheet:"));
        assert!(reply.contains("• 12.50 in 'Food' (Lunch)"));
        assert!(reply.contains("• 3.00 in 'Food'"));
        assert!(reply.contains("Total: 45.00 | Limit: 1800.00 | Left: 1755.00"));
    }

    #[test]
    fn test_success_reply_mentions_image_source() {
        let records = vec![ExpenseRecord {
            user_id: 1,
            amount: 9.0,
            category: Category::Groceries,
            description: None,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
        }];

        let reply = success_reply(&records, None, MessageSource::Image);
        assert!(reply.contains("expense(s) from the image to Google Sheet"));
    }
}
