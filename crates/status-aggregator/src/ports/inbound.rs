//! Inbound Ports (Driving Ports)
//!
//! The API presentation layers bind to.

use async_trait::async_trait;
use shared_types::{
    AggregatedSnapshot, AuthSnapshot, PermissionStatus, QuotaSnapshot, ServiceRunSnapshot,
    StatusDomain,
};
use tokio::sync::watch;

use crate::error::AggregatorError;

/// Observable aggregated status (Driving Port).
///
/// Each domain is an independent `watch` channel: a receiver is notified
/// once per replaced snapshot and always reads a whole snapshot.
#[async_trait]
pub trait StatusObserverApi: Send + Sync {
    /// Observe the auth snapshot.
    fn auth(&self) -> watch::Receiver<AuthSnapshot>;

    /// Observe the background service snapshot.
    fn service_run(&self) -> watch::Receiver<ServiceRunSnapshot>;

    /// Observe the accessibility permission snapshot.
    fn permission(&self) -> watch::Receiver<PermissionStatus>;

    /// Observe the quota snapshot.
    fn quota(&self) -> watch::Receiver<QuotaSnapshot>;

    /// Consistent copy of all four snapshots, taken in a single actor turn.
    async fn snapshot(&self) -> Result<AggregatedSnapshot, AggregatorError>;

    /// Re-query one domain now and wait until the result is applied.
    async fn refresh(&self, domain: StatusDomain) -> Result<(), AggregatorError>;
}
