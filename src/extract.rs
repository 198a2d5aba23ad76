//! Metric extraction from raw audit results
//!
//! Pulls the five Lighthouse timing/layout audits out of a PageSpeed
//! response. A missing audit entry reads as 0; a missing audit section
//! fails the whole extraction.

use crate::error::{MonitorError, Result};
use crate::types::{AuditResult, MetricRecord, Strategy};
use chrono::{Local, NaiveDateTime, Timelike};

pub const CLS_KEY: &str = "cumulative-layout-shift";
pub const TBT_KEY: &str = "total-blocking-time";
pub const SI_KEY: &str = "speed-index";
pub const LCP_KEY: &str = "largest-contentful-paint";
pub const FCP_KEY: &str = "first-contentful-paint";

/// Extract a metric record stamped with the current local time.
///
/// `None` (the fetch failed) short-circuits to an error without looking at
/// anything.
pub fn extract(
    result: Option<&AuditResult>,
    target: &str,
    strategy: Strategy,
) -> Result<MetricRecord> {
    extract_at(result, target, strategy, now_seconds())
}

/// Extract a metric record with an explicit capture time
pub fn extract_at(
    result: Option<&AuditResult>,
    target: &str,
    strategy: Strategy,
    captured_at: NaiveDateTime,
) -> Result<MetricRecord> {
    let failure = |reason: &str| MonitorError::Extraction {
        target: target.to_string(),
        strategy: strategy.to_string(),
        reason: reason.to_string(),
    };

    let result = result.ok_or_else(|| failure("no audit result"))?;
    let audits = result
        .audits()
        .ok_or_else(|| failure("response has no lighthouseResult.audits section"))?;

    let numeric = |key: &str| {
        audits
            .get(key)
            .and_then(|audit| audit.get("numericValue"))
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    };

    Ok(MetricRecord {
        url: target.to_string(),
        captured_at,
        cls: round_to(numeric(CLS_KEY), 3),
        tbt: round_to(numeric(TBT_KEY), 2),
        si: round_to(numeric(SI_KEY), 2),
        lcp: round_to(numeric(LCP_KEY), 2),
        fcp: round_to(numeric(FCP_KEY), 2),
        strategy,
    })
}

/// Round to `decimals` places, exact ties to even
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
