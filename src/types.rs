//! Core types for the monitoring pipeline
//!
//! Strategies, raw audit results, extracted metric records, and the
//! per-unit outcomes reported back from a cycle.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timestamp format written to the sink's Date column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Audit mode requested from the audit service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    /// Both strategies, in dispatch order
    pub const ALL: [Strategy; 2] = [Strategy::Mobile, Strategy::Desktop];

    /// Query-string value (`mobile`, `desktop`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }

    /// Capitalized label written to the Screen column
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Mobile => "Mobile",
            Strategy::Desktop => "Desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response body of one audit request
///
/// Kept opaque; only the extractor looks inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditResult {
    body: serde_json::Value,
}

impl AuditResult {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }

    /// The full JSON body
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// The `lighthouseResult.audits` object, if present
    pub fn audits(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.body
            .get("lighthouseResult")
            .and_then(|lh| lh.get("audits"))
            .and_then(|audits| audits.as_object())
    }
}

impl From<serde_json::Value> for AuditResult {
    fn from(body: serde_json::Value) -> Self {
        Self::new(body)
    }
}

/// One row of performance metrics for a (target, strategy) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Audited page
    pub url: String,

    /// Local wall-clock capture time, seconds resolution
    pub captured_at: NaiveDateTime,

    /// Cumulative layout shift, 3 decimals
    pub cls: f64,

    /// Total blocking time in ms, 2 decimals
    pub tbt: f64,

    /// Speed index in ms, 2 decimals
    pub si: f64,

    /// Largest contentful paint in ms, 2 decimals
    pub lcp: f64,

    /// First contentful paint in ms, 2 decimals
    pub fcp: f64,

    /// Strategy the audit ran under
    pub strategy: Strategy,
}

impl MetricRecord {
    /// Column headers matching [`MetricRecord::row`]
    pub const COLUMNS: [&'static str; 8] =
        ["URL", "Date", "CLS", "TBT", "SI", "LCP", "FCP", "Screen"];

    /// Render the record as the fixed-width sink row
    pub fn row(&self) -> Vec<serde_json::Value> {
        vec![
            serde_json::Value::from(self.url.as_str()),
            serde_json::Value::from(self.captured_at.format(DATE_FORMAT).to_string()),
            serde_json::Value::from(self.cls),
            serde_json::Value::from(self.tbt),
            serde_json::Value::from(self.si),
            serde_json::Value::from(self.lcp),
            serde_json::Value::from(self.fcp),
            serde_json::Value::from(self.strategy.label()),
        ]
    }
}

/// Chain stage at which a unit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Fetch,
    Extract,
    Append,
    /// The unit's task panicked
    Panic,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Fetch => "fetch",
            FailureStage::Extract => "extract",
            FailureStage::Append => "append",
            FailureStage::Panic => "panic",
        };
        f.write_str(s)
    }
}

/// Why a unit produced no row
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub stage: FailureStage,
    pub reason: String,
}

/// Tagged outcome of one fetch → extract → append chain
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Completed(MetricRecord),
    Failed(UnitFailure),
}

impl UnitOutcome {
    pub(crate) fn failed(stage: FailureStage, reason: impl Into<String>) -> Self {
        UnitOutcome::Failed(UnitFailure {
            stage,
            reason: reason.into(),
        })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, UnitOutcome::Completed(_))
    }
}

/// Completion notice for one unit, delivered on the cycle channel
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub cycle_id: String,
    pub target: String,
    pub strategy: Strategy,
    pub outcome: UnitOutcome,
    pub duration: Duration,
}

/// Aggregated view of a finished cycle
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    pub cycle_id: String,

    /// Units enqueued by the cycle
    pub dispatched: usize,

    /// Units that appended a row
    pub completed: usize,

    /// Units that failed at any stage
    pub failed: usize,

    /// Reports for the failed units, in completion order
    pub failures: Vec<UnitReport>,
}

impl CycleSummary {
    /// Fold one unit report into the summary
    pub fn record(&mut self, report: UnitReport) {
        match report.outcome {
            UnitOutcome::Completed(_) => self.completed += 1,
            UnitOutcome::Failed(_) => {
                self.failed += 1;
                self.failures.push(report);
            }
        }
    }

    /// Units that never reported back (worker pool shut down mid-cycle)
    pub fn missing(&self) -> usize {
        self.dispatched.saturating_sub(self.completed + self.failed)
    }
}
