use std::future::Future;

use log::error;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ExpenseBotError, Result};
use crate::sheets::auth::TokenProvider;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Handle to one worksheet inside a spreadsheet. The numeric id is what the
/// batch-update operations (row insertion) address; the title is what ranges
/// address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}

/// The spreadsheet operations the ledger needs. The production
/// implementation is [`SheetsClient`]; tests substitute an in-memory fake,
/// which is the reason this seam exists at all.
pub trait SpreadsheetBackend {
    fn find_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> impl Future<Output = Result<Option<SheetProperties>>> + Send;

    fn add_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> impl Future<Output = Result<SheetProperties>> + Send;

    /// Reads a bounded range as formatted values (what the user sees in the
    /// sheet). Missing trailing cells and rows are simply absent.
    fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send;

    /// Writes values with USER_ENTERED semantics: numeric and date-like
    /// strings are typed natively by the backend, and `=` strings become
    /// live formulas.
    fn update_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Appends rows after the last data row of the table containing `range`,
    /// with USER_ENTERED semantics.
    fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Inserts `count` blank rows at `start_index` (0-based), pushing
    /// existing rows down.
    fn insert_rows(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        start_index: i64,
        count: i64,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetPropertiesDto,
}

#[derive(Deserialize)]
struct SheetPropertiesDto {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

impl From<SheetPropertiesDto> for SheetProperties {
    fn from(dto: SheetPropertiesDto) -> Self {
        Self {
            sheet_id: dto.sheet_id,
            title: dto.title,
        }
    }
}

#[derive(Deserialize)]
struct BatchUpdateReply {
    #[serde(default)]
    replies: Vec<ReplyEntry>,
}

#[derive(Deserialize)]
struct ReplyEntry {
    #[serde(rename = "addSheet")]
    add_sheet: Option<SheetEntry>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// REST implementation against the Sheets v4 API, authenticated with the
/// process-wide service-account token.
pub struct SheetsClient {
    http: reqwest::Client,
    auth: TokenProvider,
    base_url: String,
}

impl SheetsClient {
    pub fn new(auth: TokenProvider) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            base_url: SHEETS_BASE_URL.to_string(),
        }
    }

    /// The address users must grant edit access to.
    pub fn client_email(&self) -> &str {
        self.auth.client_email()
    }

    /// Maps the backend's precondition failures onto actionable errors:
    /// a 404 means the spreadsheet id is wrong, a 403 means the service
    /// account was never granted access.
    async fn check(
        &self,
        response: reqwest::Response,
        spreadsheet_id: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(
            "Spreadsheet backend returned {} for '{}': {}",
            status, spreadsheet_id, body
        );
        match status {
            reqwest::StatusCode::NOT_FOUND => {
                Err(ExpenseBotError::SpreadsheetNotFound(spreadsheet_id.into()))
            }
            reqwest::StatusCode::FORBIDDEN => Err(ExpenseBotError::SpreadsheetAccessDenied(
                spreadsheet_id.into(),
            )),
            _ => Err(ExpenseBotError::SheetsApi { status, body }),
        }
    }
}

impl SpreadsheetBackend for SheetsClient {
    async fn find_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Option<SheetProperties>> {
        let url = format!(
            "{}/{}?fields=sheets.properties(sheetId,title)",
            self.base_url, spreadsheet_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.auth.token().await?)
            .send()
            .await?;
        let meta: SpreadsheetMeta = self.check(response, spreadsheet_id).await?.json().await?;

        Ok(meta
            .sheets
            .into_iter()
            .map(|entry| SheetProperties::from(entry.properties))
            .find(|sheet| sheet.title == title))
    }

    async fn add_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<SheetProperties> {
        let url = format!("{}/{}:batchUpdate", self.base_url, spreadsheet_id);
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth.token().await?)
            .json(&body)
            .send()
            .await?;
        let reply: BatchUpdateReply = self.check(response, spreadsheet_id).await?.json().await?;

        reply
            .replies
            .into_iter()
            .find_map(|entry| entry.add_sheet)
            .map(|entry| SheetProperties::from(entry.properties))
            .ok_or_else(|| {
                ExpenseBotError::MalformedReply(
                    "addSheet reply missing sheet properties".to_string(),
                )
            })
    }

    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{}/{}/values/{}?valueRenderOption=FORMATTED_VALUE",
            self.base_url, spreadsheet_id, range
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.auth.token().await?)
            .send()
            .await?;
        let body: ValueRange = self.check(response, spreadsheet_id).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<()> {
        let url = format!(
            "{}/{}/values/{}?valueInputOption=USER_ENTERED",
            self.base_url, spreadsheet_id, range
        );
        let response = self
            .http
            .put(&url)
            .bearer_auth(self.auth.token().await?)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        self.check(response, spreadsheet_id).await?;
        Ok(())
    }

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<()> {
        let url = format!(
            "{}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.base_url, spreadsheet_id, range
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth.token().await?)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        self.check(response, spreadsheet_id).await?;
        Ok(())
    }

    async fn insert_rows(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        start_index: i64,
        count: i64,
    ) -> Result<()> {
        let url = format!("{}/{}:batchUpdate", self.base_url, spreadsheet_id);
        let body = json!({
            "requests": [{
                "insertDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start_index,
                        "endIndex": start_index + count
                    },
                    "inheritFromBefore": false
                }
            }]
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth.token().await?)
            .json(&body)
            .send()
            .await?;
        self.check(response, spreadsheet_id).await?;
        Ok(())
    }
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
