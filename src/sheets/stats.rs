use log::{error, info};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ExpenseBotError, Result};
use crate::sheets::client::SpreadsheetBackend;
use crate::sheets::ledger::a1;

/// Reserved cell region for the stats block: label column G, value column H.
pub const STATS_WRITE_RANGE: &str = "G2:H5";
/// The three computed value cells (Total, Limit, Left).
pub const STATS_READ_RANGE: &str = "H3:H5";

/// Derived monthly figures read back from the stats block after the backend
/// recalculates the formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub total: f64,
    pub limit: f64,
    pub left: f64,
}

/// Rewrites the stats block and reads the computed values back. Total and
/// Left are written as formulas, not precomputed values, so the backend
/// keeps them live as rows accumulate below.
pub async fn refresh_stats<B: SpreadsheetBackend>(
    backend: &B,
    spreadsheet_id: &str,
    sheet_title: &str,
    limit: f64,
) -> Result<MonthlyStats> {
    let block: Vec<Vec<Value>> = vec![
        vec![json!("Stats"), json!("")],
        vec![json!("Total"), json!("=SUM(C2:C)")],
        vec![json!("Limit"), json!(limit)],
        vec![json!("Left"), json!("=H4-H3")],
    ];

    backend
        .update_range(spreadsheet_id, &a1(sheet_title, STATS_WRITE_RANGE), block)
        .await?;
    info!(
        "Successfully updated stats structure in worksheet '{}'.",
        sheet_title
    );

    let rows = backend
        .read_range(spreadsheet_id, &a1(sheet_title, STATS_READ_RANGE))
        .await?;
    if rows.len() != 3 {
        error!("Read unexpected number of rows for stats: {}", rows.len());
        return Err(ExpenseBotError::StatsShape(rows.len()));
    }

    let stats = MonthlyStats {
        total: parse_stat(&rows[0])?,
        limit: parse_stat(&rows[1])?,
        left: parse_stat(&rows[2])?,
    };
    info!("Successfully read stats values: {:?}", stats);
    Ok(stats)
}

/// Formatted values may carry thousands separators; strip them before
/// parsing.
fn parse_stat(row: &[String]) -> Result<f64> {
    let cell = row
        .first()
        .ok_or_else(|| ExpenseBotError::StatsValue(String::new()))?;
    cell.replace(',', "")
        .trim()
        .parse::<f64>()
        .map_err(|_| ExpenseBotError::StatsValue(cell.clone()))
}
