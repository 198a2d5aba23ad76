//! Logging setup for the binary

use crate::error::{MonitorError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("pagespeed_monitor={}", level)
}

/// Install the global subscriber: console always, plus `log_file` (appended
/// to) unless it is empty.
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(log_file: &str, verbose: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into());

    let file_layer = if log_file.trim().is_empty() {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| {
                MonitorError::Config(format!("Failed to open log file {}: {}", log_file, e))
            })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| MonitorError::Config(format!("Failed to install logger: {}", e)))
}
