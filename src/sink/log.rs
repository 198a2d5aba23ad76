//! Dry-run sink that writes rows to the log instead of a spreadsheet

use super::ResultSink;
use crate::error::Result;
use crate::types::{MetricRecord, DATE_FORMAT};
use async_trait::async_trait;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn append(&self, record: &MetricRecord) -> Result<()> {
        tracing::info!(
            url = %record.url,
            date = %record.captured_at.format(DATE_FORMAT),
            cls = record.cls,
            tbt = record.tbt,
            si = record.si,
            lcp = record.lcp,
            fcp = record.fcp,
            screen = record.strategy.label(),
            "Row (dry run)"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
