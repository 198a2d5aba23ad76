//! # pagespeed-monitor
//!
//! Periodic PageSpeed Insights audits, appended as rows to a Google Sheet.
//!
//! ## Overview
//!
//! Every cycle audits each target twice (mobile and desktop). Each of those
//! units fetches a report, extracts five Core Web Vitals, and appends one
//! row. Units run concurrently on a bounded worker pool and fail
//! independently: a timeout, a malformed report or a rejected append ends
//! that unit alone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagespeed_monitor::{
//!     MemorySink, PageSpeedClient, PageSpeedConfig, RunnerConfig, TargetList, TaskRunner,
//! };
//!
//! # async fn example() -> pagespeed_monitor::Result<()> {
//! let client = PageSpeedClient::new(PageSpeedConfig::default())?;
//! let sink = MemorySink::new();
//! let runner = TaskRunner::new(RunnerConfig::default(), Arc::new(client), Arc::new(sink.clone()));
//!
//! let targets = TargetList::from_urls(["https://example.com"])?;
//! let summary = runner.run_cycle(&targets).await.wait().await;
//!
//! println!("{} rows appended", summary.completed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Sinks
//!
//! - **sheets**: Google Sheets `values.append`, authenticated with a service account
//! - **memory**: in-process, for tests and embedding
//! - **log**: writes rows to the log (`--dry-run`)
//!
//! ## Architecture
//!
//! - **AuditClient** trait: one audit request per (target, strategy)
//! - **extract**: audit report to `MetricRecord`
//! - **ResultSink** trait: append-only row destination
//! - **TaskRunner**: fans a cycle out over the worker pool
//! - **Scheduler**: immediate first cycle, then one per interval

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod runner;
pub mod scheduler;
pub mod sink;
pub mod targets;
pub mod types;

// Re-export core types
pub use audit::{AuditClient, PageSpeedClient, PageSpeedConfig};
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use extract::extract;
pub use runner::{CycleHandle, RunnerConfig, TaskRunner};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerEvent};
pub use targets::TargetList;
pub use types::{
    AuditResult, CycleSummary, FailureStage, MetricRecord, Strategy, UnitFailure, UnitOutcome,
    UnitReport,
};

// Re-export sinks for convenience
pub use sink::{
    LogSink, MemorySink, ResultSink, ServiceAccountKey, ServiceAccountTokenProvider, SheetsConfig,
    SheetsSink, StaticTokenProvider, TokenProvider,
};
