//! In-memory sink for tests and embedding

use super::ResultSink;
use crate::error::Result;
use crate::types::MetricRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collects appended records in a `Vec`
///
/// Cloning shares the underlying storage, so a test can hand one clone to
/// the runner and inspect another.
#[derive(Clone, Default)]
pub struct MemorySink {
    rows: Arc<RwLock<Vec<MetricRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All appended records, in append order
    pub async fn records(&self) -> Vec<MetricRecord> {
        self.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&self, record: &MetricRecord) -> Result<()> {
        self.rows.write().await.push(record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
