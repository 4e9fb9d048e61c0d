//! # Status Hub
//!
//! Entry point: initialize telemetry, load configuration, run until Ctrl+C.

use anyhow::{Context, Result};
use status_runtime::config::RuntimeConfig;
use status_runtime::StatusRuntime;
use status_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;

    let runtime = StatusRuntime::start(config).await?;

    info!("Status hub is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await
}
