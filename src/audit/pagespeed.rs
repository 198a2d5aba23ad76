//! PageSpeed Insights v5 client

use super::AuditClient;
use crate::error::{truncate_body, MonitorError, Result};
use crate::types::{AuditResult, Strategy};
use async_trait::async_trait;
use std::time::Duration;

/// Default PageSpeed Insights endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Lighthouse analysis can take well over a minute for heavy pages
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for [`PageSpeedClient`]
#[derive(Debug, Clone)]
pub struct PageSpeedConfig {
    /// Full URL of the `runPagespeed` endpoint
    pub endpoint: String,

    /// API key; omitted from the query when empty
    pub api_key: String,

    /// Per-request deadline
    pub timeout: Duration,
}

impl Default for PageSpeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP audit client for the PageSpeed Insights API
pub struct PageSpeedClient {
    http: reqwest::Client,
    config: PageSpeedConfig,
}

impl PageSpeedClient {
    /// Build a client with its own connection pool
    pub fn new(config: PageSpeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pagespeed-monitor/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &PageSpeedConfig {
        &self.config
    }

    fn query<'a>(&'a self, target: &'a str, strategy: Strategy) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("url", target),
            ("strategy", strategy.as_str()),
            ("category", "performance"),
        ];
        if !self.config.api_key.is_empty() {
            params.push(("key", self.config.api_key.as_str()));
        }
        params
    }
}

#[async_trait]
impl AuditClient for PageSpeedClient {
    async fn fetch(&self, target: &str, strategy: Strategy) -> Result<AuditResult> {
        tracing::info!(target_url = %target, %strategy, "Requesting audit");

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&self.query(target, strategy))
            .send()
            .await
            .map_err(|e| MonitorError::from_reqwest(target, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::Status {
                service: "PageSpeed".to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MonitorError::from_reqwest(target, e))?;

        tracing::info!(target_url = %target, %strategy, "Audit data received");
        Ok(AuditResult::new(body))
    }

    fn name(&self) -> &str {
        "pagespeed"
    }
}
