use chrono::{DateTime, Utc};
use log::info;
use serde_json::{json, Value};

use crate::error::{ExpenseBotError, Result};
use crate::record::ExpenseRecord;
use crate::sheets::client::{SheetProperties, SpreadsheetBackend};
use crate::sheets::stats::{refresh_stats, MonthlyStats};

/// Canonical header row. The writer reconciles existing sheets against this
/// before appending anything.
pub const LEDGER_HEADERS: [&str; 5] = ["Timestamp", "UserID", "Amount", "Category", "Description"];

/// Grid allocation for freshly created monthly sheets.
const SHEET_ROWS: u32 = 100;
const SHEET_COLS: u32 = 10;

const ROW_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const HEADER_RANGE: &str = "A1:E1";

/// Monthly sheet title: two-digit month, four-digit year.
pub fn monthly_sheet_title(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%m-%Y").to_string()
}

/// Quotes a sheet title into an A1 range reference.
pub(crate) fn a1(sheet_title: &str, range: &str) -> String {
    format!("'{}'!{}", sheet_title, range)
}

/// Routes records to the correct monthly sheet and appends them, then
/// refreshes the stats block on the same sheet.
pub struct LedgerWriter<B> {
    backend: B,
    monthly_limit: f64,
}

impl<B: SpreadsheetBackend> LedgerWriter<B> {
    pub fn new(backend: B, monthly_limit: f64) -> Self {
        Self {
            backend,
            monthly_limit,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Appends `records` to the monthly sheet derived from the FIRST
    /// record's timestamp. Batches are assumed same-month by the caller; a
    /// batch spanning a month boundary lands entirely in the first record's
    /// month.
    ///
    /// A failure during the stats refresh is reported as a failure of the
    /// whole call even though the rows are already durably appended; the
    /// `StatsRefresh` wrapper keeps that asymmetry visible to the caller.
    pub async fn append(
        &self,
        records: &[ExpenseRecord],
        spreadsheet_id: &str,
    ) -> Result<MonthlyStats> {
        let first = records.first().ok_or(ExpenseBotError::EmptyBatch)?;
        let title = monthly_sheet_title(&first.timestamp);

        match self.backend.find_sheet(spreadsheet_id, &title).await? {
            Some(sheet) => self.reconcile_headers(spreadsheet_id, &sheet).await?,
            None => {
                info!(
                    "Worksheet '{}' not found. Creating new monthly sheet.",
                    title
                );
                self.backend
                    .add_sheet(spreadsheet_id, &title, SHEET_ROWS, SHEET_COLS)
                    .await?;
                self.write_headers(spreadsheet_id, &title).await?;
            }
        }

        let rows: Vec<Vec<Value>> = records.iter().map(expense_row).collect();
        self.backend
            .append_rows(spreadsheet_id, &a1(&title, HEADER_RANGE), rows)
            .await?;
        info!(
            "Successfully appended {} expense records to sheet '{}'.",
            records.len(),
            title
        );

        refresh_stats(&self.backend, spreadsheet_id, &title, self.monthly_limit)
            .await
            .map_err(|e| ExpenseBotError::StatsRefresh(Box::new(e)))
    }

    /// Header drift policy: a missing header row is written in place; a
    /// mismatched one gets the canonical header prepended above it, pushing
    /// the old row down rather than deleting it.
    async fn reconcile_headers(
        &self,
        spreadsheet_id: &str,
        sheet: &SheetProperties,
    ) -> Result<()> {
        let existing = self
            .backend
            .read_range(spreadsheet_id, &a1(&sheet.title, HEADER_RANGE))
            .await?;
        let first_row = existing.into_iter().next().unwrap_or_default();

        if first_row == LEDGER_HEADERS {
            return Ok(());
        }

        if first_row.iter().all(|cell| cell.trim().is_empty()) {
            self.write_headers(spreadsheet_id, &sheet.title).await?;
            info!("Inserted headers into empty worksheet.");
        } else {
            self.backend
                .insert_rows(spreadsheet_id, sheet.sheet_id, 0, 1)
                .await?;
            self.write_headers(spreadsheet_id, &sheet.title).await?;
            info!("Prepended headers to worksheet.");
        }
        Ok(())
    }

    async fn write_headers(&self, spreadsheet_id: &str, sheet_title: &str) -> Result<()> {
        let header: Vec<Value> = LEDGER_HEADERS.iter().map(|h| json!(h)).collect();
        self.backend
            .update_range(spreadsheet_id, &a1(sheet_title, HEADER_RANGE), vec![header])
            .await
    }
}

/// Renders one record as a sheet row. The amount stays a native number and
/// the timestamp a date-like string so USER_ENTERED input typing applies.
fn expense_row(record: &ExpenseRecord) -> Vec<Value> {
    vec![
        json!(record.timestamp.format(ROW_TIMESTAMP_FORMAT).to_string()),
        json!(record.user_id.to_string()),
        json!(record.amount),
        json!(record.category.to_string()),
        json!(record.description.clone().unwrap_or_default()),
    ]
}
