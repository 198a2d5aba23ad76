//! Error types for pagespeed-monitor

use thiserror::Error;

/// Errors that can occur while auditing, extracting, or appending
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Transport-level HTTP failure (connect, TLS, body read)
    #[error("HTTP error for {url}: {reason}")]
    Http { url: String, reason: String },

    /// Remote service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    /// Request exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Audit result lacked the expected structure
    #[error("Extraction failed for {target} ({strategy}): {reason}")]
    Extraction {
        target: String,
        strategy: String,
        reason: String,
    },

    /// Credential loading or token exchange failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Sink rejected the row
    #[error("Sink error: {0}")]
    Sink(String),

    /// Target URL rejected on insertion
    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    /// Map a reqwest error onto the timeout / transport split
    ///
    /// The request URL is stripped from the error text since it carries
    /// the API key.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            MonitorError::Timeout(format!("request to {} exceeded its deadline", url))
        } else if err.is_decode() {
            MonitorError::Decode(err.to_string())
        } else {
            MonitorError::Http {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Longest remote error body carried in an error, in characters
pub(crate) const MAX_ERROR_BODY: usize = 512;

/// Cap a remote error body at [`MAX_ERROR_BODY`] characters
pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
