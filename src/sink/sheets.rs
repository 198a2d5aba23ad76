//! Google Sheets append sink

use super::auth::TokenProvider;
use super::ResultSink;
use crate::error::{truncate_body, MonitorError, Result};
use crate::types::MetricRecord;
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_RANGE: &str = "Sheet1!A:H";

/// Where rows are appended
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet identifier from the sheet URL
    pub sheet_id: String,

    /// A1 range the append targets; new rows land after its last row
    pub range: String,

    /// API root, overridable for tests
    pub base_url: String,

    pub timeout: Duration,
}

impl SheetsConfig {
    pub fn new(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            range: DEFAULT_RANGE.to_string(),
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// `values:append` URL for the configured sheet and range
    ///
    /// Sheet id and range are percent-encoded as path segments, so sheet
    /// names containing `#`, `?` or spaces stay inside the path.
    pub fn append_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            MonitorError::Config(format!("Invalid Sheets base URL '{}': {}", self.base_url, e))
        })?;
        let action = format!("{}:append", self.range);
        url.path_segments_mut()
            .map_err(|_| {
                MonitorError::Config(format!("Sheets base URL '{}' has no path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.sheet_id.as_str(), "values", action.as_str()]);
        Ok(url)
    }
}

/// Appends each record as one raw row via `spreadsheets.values.append`
pub struct SheetsSink {
    http: reqwest::Client,
    config: SheetsConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl SheetsSink {
    pub fn new(config: SheetsConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        if config.sheet_id.trim().is_empty() {
            return Err(MonitorError::Config("Sheet id is empty".to_string()));
        }
        config.append_url()?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("pagespeed-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }
}

#[async_trait]
impl ResultSink for SheetsSink {
    async fn append(&self, record: &MetricRecord) -> Result<()> {
        let token = self.tokens.token().await?;
        let url = self.config.append_url()?;
        let body = serde_json::json!({ "values": [record.row()] });

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body)
            .send()
            .await
            .map_err(|e| MonitorError::Sink(format!("Append request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Status {
                service: "Sheets".to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        tracing::info!(
            url = %record.url,
            screen = record.strategy.label(),
            "Row written to sheet"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "sheets"
    }
}
