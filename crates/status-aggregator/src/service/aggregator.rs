//! Status Aggregator
//!
//! Owns one tracker per domain and the state actor they write through.
//!
//! ## Startup Sequence
//!
//! 1. Spawn the state actor (all snapshots start at their unknown value)
//! 2. For each domain in `StatusDomain::STARTUP_ORDER`: refresh, then subscribe
//! 3. Mark the aggregator initialized
//!
//! The aggregator is created once by the process entry point and shared by
//! handle. Nothing about it is global.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    AggregatedSnapshot, AuthSnapshot, PermissionStatus, QuotaSnapshot, ServiceRunSnapshot,
    StatusDomain,
};
use status_telemetry::domain_span;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

use crate::adapters::NotificationBuses;
use crate::domain::query_for;
use crate::error::AggregatorError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::ports::{AvatarLoader, StatusObserverApi, StatusSource};
use crate::service::state_actor::{spawn_state_actor, AggregatedState, StateHandle};
use crate::service::tracker::{DomainTracker, TrackerSubscription};
use crate::DEFAULT_MAILBOX_CAPACITY;

/// Aggregator tuning.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Pending updates the state actor buffers before trackers wait.
    pub mailbox_capacity: usize,
    /// Publish `AuthLoggedOut` on the service bus when auth logs out.
    pub announce_logout: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            announce_logout: true,
        }
    }
}

/// External collaborators the aggregator is built from.
#[derive(Clone)]
pub struct AggregatorDeps {
    /// Source of truth for every domain.
    pub source: Arc<dyn StatusSource>,
    /// Avatar cache poked after each auth refresh.
    pub avatar: Arc<dyn AvatarLoader>,
    /// Notification channels.
    pub buses: NotificationBuses,
}

/// Process-wide status aggregator.
pub struct StatusAggregator {
    state: AggregatedState,
    handle: StateHandle,
    trackers: HashMap<StatusDomain, DomainTracker>,
    subscriptions: Arc<Mutex<Vec<TrackerSubscription>>>,
    ready: watch::Receiver<bool>,
    init_task: Mutex<Option<JoinHandle<()>>>,
    actor_task: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<Metrics>,
}

impl StatusAggregator {
    /// Start the aggregator on the current Tokio runtime.
    ///
    /// Returns immediately; population runs in the background. Await
    /// [`initialized`](Self::initialized) for deterministic startup.
    pub fn start(deps: AggregatorDeps, config: AggregatorConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        let (handle, state, actor_task) =
            spawn_state_actor(config.mailbox_capacity, deps.avatar, metrics.clone());

        let announce = config
            .announce_logout
            .then(|| Arc::clone(&deps.buses.service));

        let trackers: HashMap<StatusDomain, DomainTracker> = StatusDomain::STARTUP_ORDER
            .iter()
            .map(|&domain| {
                let tracker = DomainTracker::new(
                    query_for(domain),
                    Arc::clone(&deps.source),
                    handle.clone(),
                    metrics.clone(),
                    (domain == StatusDomain::Auth)
                        .then(|| announce.clone())
                        .flatten(),
                );
                (domain, tracker)
            })
            .collect();

        let subscriptions = Arc::new(Mutex::new(Vec::with_capacity(trackers.len())));
        let (ready_tx, ready) = watch::channel(false);

        let ordered: Vec<DomainTracker> = StatusDomain::STARTUP_ORDER
            .iter()
            .filter_map(|domain| trackers.get(domain).cloned())
            .collect();
        let init_task = tokio::spawn(initialize(
            ordered,
            deps.buses,
            Arc::clone(&subscriptions),
            ready_tx,
        ));

        Self {
            state,
            handle,
            trackers,
            subscriptions,
            ready,
            init_task: Mutex::new(Some(init_task)),
            actor_task: Mutex::new(Some(actor_task)),
            metrics,
        }
    }

    /// Wait until every domain has been populated and subscribed.
    pub async fn initialized(&self) -> Result<(), AggregatorError> {
        let mut ready = self.ready.clone();
        ready
            .wait_for(|done| *done)
            .await
            .map(|_| ())
            .map_err(|_| AggregatorError::InitializationAborted)
    }

    /// Whether startup population has finished.
    pub fn is_initialized(&self) -> bool {
        *self.ready.borrow()
    }

    /// Read side of the aggregated status.
    pub fn state(&self) -> AggregatedState {
        self.state.clone()
    }

    /// Tracker for one domain.
    pub fn tracker(&self, domain: StatusDomain) -> Option<&DomainTracker> {
        self.trackers.get(&domain)
    }

    /// Dispose the notification subscription of one domain.
    ///
    /// The domain keeps its last snapshot and stops changing. Before startup
    /// has reached the domain, it is retired so that it is never subscribed.
    /// Returns `false` if the domain was already disposed.
    pub fn dispose_subscription(&self, domain: StatusDomain) -> bool {
        let Some(tracker) = self.trackers.get(&domain) else {
            return false;
        };
        // Same lock as `initialize`, so startup either sees the retired
        // tracker or has already pushed its subscription.
        let mut subscriptions = self.subscriptions.lock();
        let was_alive = tracker.is_alive();
        tracker.retire();
        if let Some(index) = subscriptions.iter().position(|s| s.domain() == domain) {
            let mut subscription = subscriptions.swap_remove(index);
            subscription.dispose();
        }
        was_alive
    }

    /// Counters for refresh activity.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispose every subscription and stop the state actor.
    ///
    /// Observers keep the last values. Calling it twice returns
    /// `ActorStopped` the second time.
    pub async fn shutdown(&self) -> Result<(), AggregatorError> {
        let init = self.init_task.lock().take();
        if let Some(init) = init {
            init.abort();
            // Once it has stopped, startup can no longer push a subscription
            let _ = init.await;
        }
        for tracker in self.trackers.values() {
            tracker.retire();
        }
        let disposed: Vec<TrackerSubscription> = self.subscriptions.lock().drain(..).collect();
        drop(disposed);

        self.handle.shutdown().await?;
        let actor = self.actor_task.lock().take();
        if let Some(actor) = actor {
            // A panicked actor has nothing left to flush
            let _ = actor.await;
        }
        info!("Status aggregator stopped");
        Ok(())
    }
}

#[async_trait]
impl StatusObserverApi for StatusAggregator {
    fn auth(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.auth()
    }

    fn service_run(&self) -> watch::Receiver<ServiceRunSnapshot> {
        self.state.service_run()
    }

    fn permission(&self) -> watch::Receiver<PermissionStatus> {
        self.state.permission()
    }

    fn quota(&self) -> watch::Receiver<QuotaSnapshot> {
        self.state.quota()
    }

    async fn snapshot(&self) -> Result<AggregatedSnapshot, AggregatorError> {
        self.handle.snapshot().await
    }

    async fn refresh(&self, domain: StatusDomain) -> Result<(), AggregatorError> {
        match self.trackers.get(&domain) {
            Some(tracker) => tracker.try_refresh().await.map(|_| ()),
            None => Ok(()),
        }
    }
}

async fn initialize(
    trackers: Vec<DomainTracker>,
    buses: NotificationBuses,
    subscriptions: Arc<Mutex<Vec<TrackerSubscription>>>,
    ready: watch::Sender<bool>,
) {
    for tracker in trackers {
        let domain = tracker.domain();
        tracker
            .refresh()
            .instrument(domain_span!("populate", domain = %domain))
            .await;
        let mut subscribed = subscriptions.lock();
        if !tracker.is_alive() {
            debug!(%domain, "Domain disposed during startup, not subscribing");
            continue;
        }
        subscribed.push(tracker.subscribe(&buses));
        debug!(%domain, "Domain populated and subscribed");
    }
    ready.send_replace(true);
    info!("Status aggregator initialized");
}
