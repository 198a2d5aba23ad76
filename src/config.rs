//! Process-wide configuration
//!
//! Loaded once at startup from a TOML file; every field has a default so a
//! missing file yields a usable (if keyless) configuration. A few secrets
//! can be supplied through the environment instead of the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audit::pagespeed::DEFAULT_ENDPOINT;
use crate::audit::PageSpeedConfig;
use crate::error::{MonitorError, Result};
use crate::runner::RunnerConfig;
use crate::scheduler::SchedulerConfig;
use crate::sink::auth::SHEETS_SCOPE;
use crate::sink::sheets::{DEFAULT_RANGE, DEFAULT_SHEETS_BASE_URL};
use crate::sink::SheetsConfig;

pub const DEFAULT_CONFIG_FILE: &str = "pagespeed.toml";

pub const ENV_API_KEY: &str = "PAGESPEED_API_KEY";
pub const ENV_SHEET_ID: &str = "PAGESPEED_SHEET_ID";
pub const ENV_CREDENTIALS: &str = "PAGESPEED_CREDENTIALS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// PageSpeed Insights API key
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Service-account JSON key used for the Sheets API
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub sheet_id: String,

    #[serde(default = "default_sheet_range")]
    pub sheet_range: String,

    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,

    /// Initial targets
    #[serde(default)]
    pub targets: Vec<String>,

    /// Concurrent audit units (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-audit request deadline (default: 120)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Seconds between cycles (default: 4 hours)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// How often the scheduler checks for due work (default: 60)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Log file, appended to; empty disables file logging
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![SHEETS_SCOPE.to_string()]
}

fn default_sheet_range() -> String {
    DEFAULT_RANGE.to_string()
}

fn default_sheets_base_url() -> String {
    DEFAULT_SHEETS_BASE_URL.to_string()
}

fn default_workers() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_interval_secs() -> u64 {
    4 * 60 * 60
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_log_file() -> String {
    "pagespeed.log".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            credentials_file: None,
            scopes: default_scopes(),
            sheet_id: String::new(),
            sheet_range: default_sheet_range(),
            sheets_base_url: default_sheets_base_url(),
            targets: Vec::new(),
            workers: default_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            interval_secs: default_interval_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            log_file: default_log_file(),
        }
    }
}

impl MonitorConfig {
    /// Load from `path`, falling back to defaults if the file is absent,
    /// then apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                MonitorError::Config(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content).map_err(|e| {
                MonitorError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MonitorError::Config(e.to_string()))
    }

    /// Overlay non-empty values from the environment
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(sheet_id) = non_empty(ENV_SHEET_ID) {
            self.sheet_id = sheet_id;
        }
        if let Some(path) = non_empty(ENV_CREDENTIALS) {
            self.credentials_file = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(MonitorError::Config("workers must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.interval_secs == 0 || self.poll_interval_secs == 0 {
            return Err(MonitorError::Config(
                "interval_secs and poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.scopes.iter().any(|s| s.trim().is_empty()) {
            return Err(MonitorError::Config("scopes must not contain empty entries".to_string()));
        }
        Ok(())
    }

    pub fn pagespeed(&self) -> PageSpeedConfig {
        PageSpeedConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn sheets(&self) -> SheetsConfig {
        SheetsConfig {
            range: self.sheet_range.clone(),
            base_url: self.sheets_base_url.clone(),
            ..SheetsConfig::new(self.sheet_id.clone())
        }
    }

    pub fn runner(&self) -> RunnerConfig {
        RunnerConfig {
            workers: self.workers,
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.interval_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.interval_secs, 14_400);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.sheet_range, "Sheet1!A:H");
        assert_eq!(config.scopes, vec![SHEETS_SCOPE.to_string()]);
        assert!(config.targets.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
            api_key = "k"
            sheet_id = "sheet-1"
            credentials_file = "/etc/pagespeed/creds.json"
            targets = ["https://example.com", "https://example.org"]
            workers = 8
            interval_secs = 3600
        "#;
        let config = MonitorConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.sheet_id, "sheet-1");
        assert_eq!(
            config.credentials_file,
            Some(PathBuf::from("/etc/pagespeed/creds.json"))
        );
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.workers, 8);
        assert_eq!(config.interval_secs, 3600);
        assert_eq!(config.poll_interval_secs, 60);
    }

    #[test]
    fn test_config_rejects_unknown_types() {
        assert!(MonitorConfig::from_toml("workers = \"four\"").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = MonitorConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_scope() {
        let config = MonitorConfig {
            scopes: vec![" ".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "from-env"),
            (ENV_SHEET_ID, ""),
            (ENV_CREDENTIALS, "/tmp/creds.json"),
        ]
        .into_iter()
        .collect();

        let mut config = MonitorConfig {
            sheet_id: "from-file".to_string(),
            ..Default::default()
        };
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.sheet_id, "from-file");
        assert_eq!(config.credentials_file, Some(PathBuf::from("/tmp/creds.json")));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonitorConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagespeed.toml");
        std::fs::write(&path, "workers = 2\nsheet_range = \"Perf!A:H\"\n").unwrap();

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.sheets().range, "Perf!A:H");
        assert_eq!(config.runner().workers, 2);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagespeed.toml");
        std::fs::write(&path, "workers = 0\n").unwrap();
        assert!(MonitorConfig::load(&path).is_err());
    }

    #[test]
    fn test_derived_configs() {
        let config = MonitorConfig {
            api_key: "k".to_string(),
            request_timeout_secs: 90,
            ..Default::default()
        };
        let ps = config.pagespeed();
        assert_eq!(ps.api_key, "k");
        assert_eq!(ps.timeout, Duration::from_secs(90));

        let sched = config.scheduler();
        assert_eq!(sched.interval, Duration::from_secs(14_400));
        assert_eq!(sched.poll_interval, Duration::from_secs(60));
    }
}
