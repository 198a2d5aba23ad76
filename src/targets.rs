//! Monitored target list
//!
//! Append-only, order-preserving, duplicates allowed. Owned by the caller
//! and handed to the runner, which reads a snapshot per cycle.

use crate::error::{MonitorError, Result};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared list of target URLs
///
/// Clones share the same list, so the menu can add targets while the
/// scheduler holds another handle.
#[derive(Debug, Clone, Default)]
pub struct TargetList {
    urls: Arc<RwLock<Vec<String>>>,
}

impl TargetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from configured targets, rejecting any invalid entry
    pub fn from_urls<I, S>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(|u| validate_target(u.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            urls: Arc::new(RwLock::new(urls)),
        })
    }

    /// Append a target, returning the normalized form that was stored
    pub async fn add(&self, url: &str) -> Result<String> {
        let url = validate_target(url)?;
        self.urls.write().await.push(url.clone());
        tracing::info!(target_url = %url, "Target added");
        Ok(url)
    }

    /// Copy of the current list
    pub async fn snapshot(&self) -> Vec<String> {
        self.urls.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.urls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.urls.read().await.is_empty()
    }
}

/// Trim and check that a target is an absolute http(s) URL
pub fn validate_target(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| MonitorError::InvalidTarget {
        target: raw.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty URL"));
    }

    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    Ok(trimmed.to_string())
}
