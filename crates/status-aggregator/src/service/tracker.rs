//! Domain trackers.
//!
//! A `DomainTracker` refreshes one domain: it runs the domain's query
//! against the source, maps failures to the fallback snapshot and hands the
//! result to the state actor. `subscribe` wires it to the notification
//! buses and returns the handle that stops it.

use shared_bus::{EventPublisher, InMemoryEventBus, StatusEvent};
use shared_types::StatusDomain;
use status_telemetry::log_domain_event;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::adapters::bus_adapter::{self, NotificationBuses};
use crate::domain::{ApplyOutcome, DomainQuery};
use crate::error::AggregatorError;
use crate::metrics::Metrics;
use crate::ports::StatusSource;
use crate::service::state_actor::StateHandle;

/// Shared flag telling the state actor whether a tracker may still write.
#[derive(Debug, Clone)]
pub(crate) struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Refreshes one status domain.
///
/// Cheap to clone; clones share the same liveness and completion counter,
/// so disposing the subscription retires every clone and concurrent
/// refreshes from any clone are ordered against each other.
#[derive(Clone)]
pub struct DomainTracker {
    query: Arc<dyn DomainQuery>,
    source: Arc<dyn StatusSource>,
    state: StateHandle,
    liveness: Liveness,
    /// Number of queries of this domain that have completed.
    completed: Arc<AtomicU64>,
    metrics: Arc<Metrics>,
    /// Bus on which a logout transition is announced.
    announce: Option<Arc<InMemoryEventBus>>,
}

impl DomainTracker {
    pub(crate) fn new(
        query: Arc<dyn DomainQuery>,
        source: Arc<dyn StatusSource>,
        state: StateHandle,
        metrics: Arc<Metrics>,
        announce: Option<Arc<InMemoryEventBus>>,
    ) -> Self {
        Self {
            query,
            source,
            state,
            liveness: Liveness::new(),
            completed: Arc::new(AtomicU64::new(0)),
            metrics,
            announce,
        }
    }

    pub fn domain(&self) -> StatusDomain {
        self.query.domain()
    }

    pub(crate) fn query(&self) -> &dyn DomainQuery {
        self.query.as_ref()
    }

    /// Whether this tracker may still change its snapshot.
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Stop accepting writes from this tracker and its clones.
    pub(crate) fn retire(&self) {
        self.liveness.revoke();
    }

    /// Re-query the source and replace the snapshot.
    ///
    /// Never fails: a source error becomes the domain's fallback snapshot,
    /// and a stopped aggregator is only logged.
    pub async fn refresh(&self) {
        if let Err(e) = self.try_refresh().await {
            debug!(domain = %self.domain(), error = %e, "Refresh skipped");
        }
    }

    /// Re-query the source and replace the snapshot, reporting what the
    /// state actor did with it.
    pub async fn try_refresh(&self) -> Result<ApplyOutcome, AggregatorError> {
        if !self.is_alive() {
            return Ok(ApplyOutcome::dropped());
        }

        let domain = self.domain();
        self.metrics.record_refresh_started();

        let fetched = self.query.fetch(self.source.as_ref()).await;
        // Stamp in completion order, before any other await.
        let sequence = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        let update = match fetched {
            Ok(update) => update,
            Err(e) => {
                self.metrics.record_query_failure();
                log_domain_event!(warn, domain, "Status query failed, using fallback", error = %e);
                self.query.fallback(&e)
            }
        };

        let outcome = self
            .state
            .apply(update, sequence, self.liveness.clone())
            .await?;

        if outcome.logged_out {
            if let Some(bus) = &self.announce {
                bus.publish(StatusEvent::auth_logged_out()).await;
            }
        }
        if outcome.changed {
            log_domain_event!(debug, domain, "Snapshot changed");
        }
        Ok(outcome)
    }

    /// Refresh on every applicable notification until the returned handle
    /// is disposed.
    pub fn subscribe(&self, buses: &NotificationBuses) -> TrackerSubscription {
        let listeners = bus_adapter::spawn_listeners(self, buses);
        TrackerSubscription {
            domain: self.domain(),
            liveness: self.liveness.clone(),
            listeners,
        }
    }
}

/// Handle to a tracker's notification listeners.
///
/// Disposing it (explicitly or by dropping it) stops the listeners and
/// retires the tracker: refreshes already in flight finish their query but
/// their result is dropped by the state actor.
pub struct TrackerSubscription {
    domain: StatusDomain,
    liveness: Liveness,
    listeners: Vec<JoinHandle<()>>,
}

impl TrackerSubscription {
    pub fn domain(&self) -> StatusDomain {
        self.domain
    }

    /// Whether the subscription is still delivering refreshes.
    pub fn is_active(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Stop all future refreshes for this domain. Idempotent.
    pub fn dispose(&mut self) {
        if !self.liveness.is_alive() && self.listeners.is_empty() {
            return;
        }
        self.liveness.revoke();
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
        log_domain_event!(debug, self.domain, "Subscription disposed");
    }
}

impl Drop for TrackerSubscription {
    fn drop(&mut self) {
        self.dispose();
    }
}
