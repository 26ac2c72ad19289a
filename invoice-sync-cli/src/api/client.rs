//! Google Sheets client
//!
//! Opens a spreadsheet by name through the Drive files API and works on its
//! first worksheet through the Sheets values API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::auth::{ServiceAccountKey, fetch_access_token};
use super::sheet::RemoteSheet;
use crate::error::{SyncError, SyncResult};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Authenticated HTTP client, not yet bound to a spreadsheet
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    token: String,
}

impl SheetsClient {
    /// Authenticate with the service-account key at `keyfile`
    pub async fn connect(keyfile: &Path, timeout: Duration) -> SyncResult<Self> {
        let key = ServiceAccountKey::from_file(keyfile)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Connection(format!("failed to build HTTP client: {}", e)))?;

        let token = fetch_access_token(&http, &key).await?;
        log::info!(
            "Authenticated as {} (token valid until {})",
            key.client_email,
            token.expires_at.format("%H:%M:%S")
        );

        Ok(Self {
            http,
            token: token.token,
        })
    }

    /// Find a spreadsheet by exact name and bind to its first worksheet
    pub async fn open_by_name(self, name: &str) -> SyncResult<GoogleSheet> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query_literal(name),
            SPREADSHEET_MIME
        );

        let response = self
            .http
            .get(DRIVE_FILES_API)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;
        let files: FileList = connect_json(response).await?;

        let file = files
            .files
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Connection(format!("spreadsheet '{}' not found", name)))?;

        let response = self
            .http
            .get(format!("{}/{}", SHEETS_API, file.id))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(title,index)")])
            .send()
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;
        let spreadsheet: Spreadsheet = connect_json(response).await?;

        let title = spreadsheet
            .sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title)
            .ok_or_else(|| {
                SyncError::Connection(format!("spreadsheet '{}' has no worksheets", name))
            })?;

        log::info!("Opened spreadsheet '{}' ({}), worksheet '{}'", file.name, file.id, title);

        Ok(GoogleSheet {
            http: self.http,
            token: self.token,
            spreadsheet_id: file.id,
            title,
        })
    }
}

/// First worksheet of a Google spreadsheet
#[derive(Debug, Clone)]
pub struct GoogleSheet {
    http: reqwest::Client,
    token: String,
    spreadsheet_id: String,
    title: String,
}

impl GoogleSheet {
    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            SHEETS_API,
            self.spreadsheet_id,
            urlencoding::encode(&sheet_range(&self.title)),
            suffix
        )
    }

    async fn append_values(&self, operation: &'static str, rows: &[Vec<String>]) -> SyncResult<()> {
        let response = self
            .http
            .post(self.values_url(":append"))
            .bearer_auth(&self.token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": rows }))
            .send()
            .await
            .map_err(|e| SyncError::remote(operation, e))?;
        check_status(response)
            .await
            .map_err(|e| SyncError::remote(operation, e))?;
        Ok(())
    }
}

#[async_trait]
impl RemoteSheet for GoogleSheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn get_all_values(&self) -> SyncResult<Vec<Vec<String>>> {
        let response = self
            .http
            .get(self.values_url(""))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SyncError::remote("read", e))?;
        let response = check_status(response)
            .await
            .map_err(|e| SyncError::remote("read", e))?;
        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| SyncError::remote("read", e))?;

        let rows = range
            .values
            .into_iter()
            .map(|row| row.iter().map(value_to_string).collect())
            .collect();
        Ok(pad_rows(rows))
    }

    async fn clear(&mut self) -> SyncResult<()> {
        let response = self
            .http
            .post(self.values_url(":clear"))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| SyncError::remote("clear", e))?;
        check_status(response)
            .await
            .map_err(|e| SyncError::remote("clear", e))?;
        log::warn!("Cleared worksheet '{}' ({})", self.title, self.spreadsheet_id);
        Ok(())
    }

    async fn append_row(&mut self, row: &[String]) -> SyncResult<()> {
        self.append_values("append_row", &[row.to_vec()]).await
    }

    async fn append_rows(&mut self, rows: &[Vec<String>]) -> SyncResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.append_values("append_rows", rows).await
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: i64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// A1 range covering a whole worksheet
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Restore trailing empty cells the values API leaves off
fn pad_rows(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows
}

fn escape_query_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pull the human-readable message out of a Google API error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(format!("HTTP {}: {}", status, api_error_message(&body)))
}

/// Decode a response from the connect phase, mapping rejections to auth errors
async fn connect_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> SyncResult<T> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Auth(format!(
            "HTTP {}: {}",
            status,
            api_error_message(&body)
        )));
    }
    let response = check_status(response).await.map_err(SyncError::Connection)?;
    response
        .json()
        .await
        .map_err(|e| SyncError::Connection(format!("unexpected response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_range_quotes_title() {
        assert_eq!(sheet_range("Sheet1"), "'Sheet1'");
        assert_eq!(sheet_range("Bob's data"), "'Bob''s data'");
    }

    #[test]
    fn test_pad_rows_to_widest() {
        let rows = vec![
            vec!["InvoiceNo".to_string(), "Customer".to_string(), String::new()],
            vec!["1001".to_string()],
        ];
        // The API returns the header without its empty trailing column
        let trimmed = vec![
            vec!["InvoiceNo".to_string(), "Customer".to_string()],
            vec!["1001".to_string()],
            vec!["1002".to_string(), "Globex".to_string(), "x".to_string()],
        ];

        let padded = pad_rows(trimmed);

        assert_eq!(padded[0], rows[0]);
        assert_eq!(padded[1], vec!["1001".to_string(), String::new(), String::new()]);
        assert!(pad_rows(Vec::new()).is_empty());
    }

    #[test]
    fn test_escape_query_literal() {
        assert_eq!(escape_query_literal("Data-automte-ex-sheet"), "Data-automte-ex-sheet");
        assert_eq!(escape_query_literal("it's"), "it\\'s");
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("1001")), "1001");
        assert_eq!(value_to_string(&json!(12.5)), "12.5");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(api_error_message(body), "The caller does not have permission");
        assert_eq!(api_error_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_value_range_without_values() {
        let range: ValueRange = serde_json::from_str(r#"{"range": "'Sheet1'!A1:Z1000", "majorDimension": "ROWS"}"#).unwrap();
        assert!(range.values.is_empty());
    }
}
