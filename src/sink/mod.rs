//! Result sinks, the append-only destination for metric records
//!
//! Every backend (Google Sheets, in-memory, log-only) implements
//! `ResultSink`. The runner calls `append` once per extracted record and
//! never batches across units, so implementations must tolerate
//! concurrent, unordered appends.

use crate::error::Result;
use crate::types::MetricRecord;
use async_trait::async_trait;

pub mod auth;
pub mod log;
pub mod memory;
pub mod sheets;

pub use auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use log::LogSink;
pub use memory::MemorySink;
pub use sheets::{SheetsConfig, SheetsSink};

/// Append-only destination for metric records
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append one record as a new row at the end of the store
    async fn append(&self, record: &MetricRecord) -> Result<()>;

    /// Sink name for logs (e.g., "sheets", "memory")
    fn name(&self) -> &str;
}
