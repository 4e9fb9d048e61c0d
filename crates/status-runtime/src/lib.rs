//! # Status Hub Runtime
//!
//! Hosts the status aggregator for one process.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Create the service bus and the system bus
//! 3. Start the aggregator and wait until every domain is populated
//! 4. Start the presenter and the poll ticker
//!
//! ## Shutdown Sequence
//!
//! 1. Signal the presenter and the ticker
//! 2. Stop the aggregator (disposes every subscription)
//! 3. Wait for the spawned tasks

pub mod adapters;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, InMemoryEventBus, StatusEvent};
use status_aggregator::{
    AggregatorDeps, AvatarLoader, NotificationBuses, StatusAggregator, StatusSource,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::{FileStatusSource, LoggingAvatarLoader, LoggingPresenter};
use crate::config::RuntimeConfig;

/// The runtime orchestrating the aggregator and its collaborators.
pub struct StatusRuntime {
    aggregator: Arc<StatusAggregator>,
    buses: NotificationBuses,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl StatusRuntime {
    /// Start against the status document named in `config`.
    pub async fn start(config: RuntimeConfig) -> Result<Self> {
        info!(path = %config.status_file.display(), "Reading status document");
        let source = Arc::new(FileStatusSource::new(config.status_file.clone()));
        Self::start_with(config, source, Arc::new(LoggingAvatarLoader)).await
    }

    /// Start with explicit source and avatar loader.
    pub async fn start_with(
        config: RuntimeConfig,
        source: Arc<dyn StatusSource>,
        avatar: Arc<dyn AvatarLoader>,
    ) -> Result<Self> {
        config.validate().context("Invalid runtime configuration")?;

        info!("===========================================");
        info!("  Status Hub Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let buses = NotificationBuses::new(config.bus_capacity);
        let aggregator = Arc::new(StatusAggregator::start(
            AggregatorDeps {
                source,
                avatar,
                buses: buses.clone(),
            },
            config.aggregator.clone(),
        ));
        aggregator
            .initialized()
            .await
            .context("Status aggregator failed to initialize")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let presenter = LoggingPresenter::new(aggregator.state()).spawn(shutdown_rx.clone());
        let ticker = tokio::spawn(poll(
            Arc::clone(&buses.service),
            config.poll_interval,
            shutdown_rx,
        ));

        info!(
            poll_secs = config.poll_interval.as_secs(),
            bus_capacity = config.bus_capacity,
            "Status hub running"
        );

        Ok(Self {
            aggregator,
            buses,
            shutdown_tx,
            tasks: Mutex::new(vec![presenter, ticker]),
        })
    }

    pub fn aggregator(&self) -> Arc<StatusAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn buses(&self) -> &NotificationBuses {
        &self.buses
    }

    /// Shut the runtime down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Initiating graceful shutdown...");

        // Receivers may already be gone if their tasks ended on their own
        let _ = self.shutdown_tx.send(true);

        self.aggregator
            .shutdown()
            .await
            .context("Failed to stop status aggregator")?;

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Runtime task ended abnormally");
            }
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// Publish `ServiceStatusChanged` every `interval` until shutdown.
async fn poll(bus: Arc<InMemoryEventBus>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Startup already populated every domain
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let receivers = bus.publish(StatusEvent::service_status_changed()).await;
                debug!(receivers, "Poll tick");
            }
            _ = shutdown.changed() => break,
        }
    }
    debug!("Poll ticker stopped");
}
