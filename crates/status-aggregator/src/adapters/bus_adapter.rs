//! Event Bus Adapter for the status trackers
//!
//! Subscribes each tracker to the notifications its domain cares about and
//! turns every matching event into an independent refresh.
//!
//! - `ServiceStatusChanged` on the service bus reaches every domain
//! - `AuthStatusChanged` on the system bus reaches the auth domain only

use shared_bus::{EventFilter, EventStream, InMemoryEventBus, NotificationScope};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::service::tracker::DomainTracker;

/// The two notification channels a process listens on.
#[derive(Clone)]
pub struct NotificationBuses {
    /// Process-local "service status changed" notifications.
    pub service: Arc<InMemoryEventBus>,
    /// System-wide "auth status changed" notifications.
    pub system: Arc<InMemoryEventBus>,
}

impl NotificationBuses {
    /// Create both buses with the given per-subscriber capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            service: Arc::new(InMemoryEventBus::for_scope(NotificationScope::Process, capacity)),
            system: Arc::new(InMemoryEventBus::for_scope(NotificationScope::System, capacity)),
        }
    }

    /// Bus that relays notifications from `scope`.
    pub fn bus(&self, scope: NotificationScope) -> &Arc<InMemoryEventBus> {
        match scope {
            NotificationScope::Process => &self.service,
            NotificationScope::System => &self.system,
        }
    }
}

/// Register the tracker's triggers and spawn one listener per trigger.
///
/// Subscriptions are registered before this returns, so no event published
/// afterwards is missed.
pub(crate) fn spawn_listeners(
    tracker: &DomainTracker,
    buses: &NotificationBuses,
) -> Vec<JoinHandle<()>> {
    tracker
        .query()
        .triggers()
        .iter()
        .map(|trigger| {
            let stream = buses
                .bus(trigger.scope)
                .event_stream(EventFilter::topic(trigger.topic));
            tokio::spawn(listen(stream, tracker.clone(), trigger.scope))
        })
        .collect()
}

async fn listen(mut stream: EventStream, tracker: DomainTracker, scope: NotificationScope) {
    let domain = tracker.domain();
    debug!(%domain, %scope, "Listening for status notifications");

    while let Some(event) = stream.next().await {
        if !tracker.is_alive() {
            break;
        }
        debug!(
            %domain,
            %scope,
            correlation_id = %event.correlation_id(),
            "Refresh requested"
        );

        // Each notification gets its own refresh; the state actor orders the writes.
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.refresh().await });
    }

    debug!(%domain, %scope, "Listener stopped");
}
