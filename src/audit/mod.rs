//! Audit client trait, the seam between the pipeline and the audit service
//!
//! The runner only talks to `AuditClient`; `PageSpeedClient` is the HTTP
//! implementation, tests substitute scripted clients.

use crate::error::Result;
use crate::types::{AuditResult, Strategy};
use async_trait::async_trait;

pub mod pagespeed;

pub use pagespeed::{PageSpeedClient, PageSpeedConfig};

/// Performs one audit request for one (target, strategy) pair
///
/// Implementations make a single attempt. Any transport failure, bad
/// status, or timeout is returned as an error value.
#[async_trait]
pub trait AuditClient: Send + Sync {
    /// Run the audit and return the raw result
    async fn fetch(&self, target: &str, strategy: Strategy) -> Result<AuditResult>;

    /// Client name for logs (e.g., "pagespeed")
    fn name(&self) -> &str;
}
