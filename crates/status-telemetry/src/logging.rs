//! Structured logging setup.
//!
//! Logs carry consistent fields so they can be grepped or shipped as JSON:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `domain`: Status domain (auth, service_run, permission, quota)
//! - `message`: Log message
//! - Additional context fields

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Structured logger handle
pub struct StructuredLogger {
    _initialized: bool,
}

/// Install the global `tracing` subscriber described by `config`.
///
/// Fails if the level filter does not parse or a global subscriber is
/// already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level {:?}: {e}", config.log_level)))?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
        return Ok(StructuredLogger { _initialized: true });
    }

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    }

    Ok(StructuredLogger { _initialized: true })
}

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_domain_event {
    // Info level with domain
    (info, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            domain = %$domain,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with domain
    (warn, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            domain = %$domain,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with domain
    (debug, $domain:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            domain = %$domain,
            $($($field)*,)?
            $msg
        )
    };
}
