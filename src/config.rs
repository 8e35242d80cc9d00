//! Configuration System
//!
//! Layered configuration for the catalog tools: defaults, then an optional
//! `wxcat.toml` (explicit path or current directory), then `WXCAT_*`
//! environment variables. Producers usually only set the catalog root; the
//! sweep and aggregation services also care about retention and lock tuning.

use crate::error::CatalogError;
use crate::lock::{LockOptions, StalePolicy};
use crate::logging::LoggingConfig;
use crate::sweeper::SweepOptions;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WxcatConfig {
    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub retention: RetentionSection,

    #[serde(default)]
    pub lock: LockSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the module's published catalog lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSection {
    /// Base retention before runs and their frames are purged.
    #[serde(default = "default_retention_hours")]
    pub hours: u64,

    /// Product-path marker that halves retention.
    #[serde(default = "default_satellite_marker")]
    pub satellite_marker: String,

    /// Description marker that extends retention to a year.
    #[serde(default = "default_long_retention_marker")]
    pub long_retention_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockSection {
    /// Seconds a contending writer waits before treating a marker as stale.
    #[serde(default = "default_lock_deadline_secs")]
    pub deadline_secs: u64,

    /// Milliseconds between existence checks while contending.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Stale-marker policy: "break", "override", or "fail".
    #[serde(default = "default_stale_policy")]
    pub stale_policy: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_retention_hours() -> u64 {
    168
}

fn default_satellite_marker() -> String {
    "satellite".to_string()
}

fn default_long_retention_marker() -> String {
    "archive".to_string()
}

fn default_lock_deadline_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_stale_policy() -> String {
    "break".to_string()
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            hours: default_retention_hours(),
            satellite_marker: default_satellite_marker(),
            long_retention_marker: default_long_retention_marker(),
        }
    }
}

impl Default for LockSection {
    fn default() -> Self {
        Self {
            deadline_secs: default_lock_deadline_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            stale_policy: default_stale_policy(),
        }
    }
}

impl WxcatConfig {
    /// Load configuration: defaults < config file < `WXCAT_*` environment.
    ///
    /// With an explicit path the file must exist; otherwise `wxcat.toml` in
    /// the current directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(
                File::with_name(&path.to_string_lossy()).required(true),
            ),
            None => builder.add_source(File::with_name("wxcat").required(false)),
        };
        builder = builder.add_source(Environment::with_prefix("WXCAT").separator("__"));

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| CatalogError::Config(e.to_string()))
    }

    /// Lock options derived from the `[lock]` section.
    pub fn lock_options(&self) -> Result<LockOptions, CatalogError> {
        let stale_policy = match self.lock.stale_policy.as_str() {
            "break" => StalePolicy::BreakLock,
            "override" => StalePolicy::Override,
            "fail" => StalePolicy::Fail,
            other => {
                return Err(CatalogError::Config(format!(
                    "Invalid stale_policy: {} (must be break, override, or fail)",
                    other
                )))
            }
        };
        Ok(LockOptions {
            deadline: Duration::from_secs(self.lock.deadline_secs),
            poll_interval: Duration::from_millis(self.lock.poll_interval_ms),
            stale_policy,
        })
    }

    /// Sweep options derived from the `[retention]` section.
    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            retention: chrono::Duration::hours(self.retention.hours as i64),
            satellite_marker: self.retention.satellite_marker.clone(),
            long_retention_marker: self.retention.long_retention_marker.clone(),
        }
    }
}
