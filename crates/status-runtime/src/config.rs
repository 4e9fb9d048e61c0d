//! # Runtime Configuration
//!
//! Everything the runtime reads from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SH_STATUS_FILE` | `status.json` | Status document written by the background service |
//! | `SH_POLL_INTERVAL_SECS` | `5` | Seconds between `ServiceStatusChanged` polls |
//! | `SH_BUS_CAPACITY` | `256` | Buffered events per bus subscriber |
//! | `SH_MAILBOX_CAPACITY` | `64` | Pending updates buffered by the state actor |

use std::path::PathBuf;
use std::time::Duration;

use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use status_aggregator::AggregatorConfig;
use thiserror::Error;

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{0} must not be zero")]
    Zero(&'static str),

    #[error("SH_STATUS_FILE must not be empty")]
    EmptyStatusFile,
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Path of the JSON status document.
    pub status_file: PathBuf,
    /// Interval between synthetic `ServiceStatusChanged` notifications.
    pub poll_interval: Duration,
    /// Per-subscriber capacity of both event buses.
    pub bus_capacity: usize,
    /// Aggregator tuning.
    pub aggregator: AggregatorConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            status_file: PathBuf::from("status.json"),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("SH_STATUS_FILE") {
            config.status_file = PathBuf::from(path);
        }
        if let Some(secs) = parse_number(&lookup, "SH_POLL_INTERVAL_SECS")? {
            config.poll_interval = Duration::from_secs(secs as u64);
        }
        if let Some(capacity) = parse_number(&lookup, "SH_BUS_CAPACITY")? {
            config.bus_capacity = capacity;
        }
        if let Some(capacity) = parse_number(&lookup, "SH_MAILBOX_CAPACITY")? {
            config.aggregator.mailbox_capacity = capacity;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStatusFile);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero("SH_POLL_INTERVAL_SECS"));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Zero("SH_BUS_CAPACITY"));
        }
        if self.aggregator.mailbox_capacity == 0 {
            return Err(ConfigError::Zero("SH_MAILBOX_CAPACITY"));
        }
        Ok(())
    }
}

fn parse_number<F>(lookup: &F, key: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
}
