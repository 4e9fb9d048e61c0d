//! # Status Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// All events that can be published to the event bus.
///
/// Events carry no status payload: they only announce that a domain may
/// have changed. Receivers re-query the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// The background service reported a change. Fans out to every domain.
    /// Source: service connection | Target: all trackers
    ServiceStatusChanged {
        /// Correlates log lines across publisher and receivers.
        correlation_id: Uuid,
    },

    /// Login state changed somewhere on the system.
    /// Source: system bus | Target: auth tracker
    AuthStatusChanged {
        /// Correlates log lines across publisher and receivers.
        correlation_id: Uuid,
    },

    /// Auth resolved to logged out and the quota snapshot was cleared.
    /// Source: aggregator | Target: any interested component
    AuthLoggedOut {
        /// Correlates log lines across publisher and receivers.
        correlation_id: Uuid,
    },
}

impl StatusEvent {
    /// New `ServiceStatusChanged` with a fresh correlation id.
    #[must_use]
    pub fn service_status_changed() -> Self {
        Self::ServiceStatusChanged {
            correlation_id: Uuid::new_v4(),
        }
    }

    /// New `AuthStatusChanged` with a fresh correlation id.
    #[must_use]
    pub fn auth_status_changed() -> Self {
        Self::AuthStatusChanged {
            correlation_id: Uuid::new_v4(),
        }
    }

    /// New `AuthLoggedOut` with a fresh correlation id.
    #[must_use]
    pub fn auth_logged_out() -> Self {
        Self::AuthLoggedOut {
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ServiceStatusChanged { .. } => EventTopic::ServiceStatus,
            Self::AuthStatusChanged { .. } => EventTopic::AuthStatus,
            Self::AuthLoggedOut { .. } => EventTopic::Session,
        }
    }

    /// Get the scope this event originates from.
    #[must_use]
    pub fn scope(&self) -> NotificationScope {
        match self {
            Self::ServiceStatusChanged { .. } | Self::AuthLoggedOut { .. } => {
                NotificationScope::Process
            }
            Self::AuthStatusChanged { .. } => NotificationScope::System,
        }
    }

    /// Get the correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        match self {
            Self::ServiceStatusChanged { correlation_id }
            | Self::AuthStatusChanged { correlation_id }
            | Self::AuthLoggedOut { correlation_id } => *correlation_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// "Service status changed" notifications.
    ServiceStatus,
    /// "Auth status changed" notifications.
    AuthStatus,
    /// Session lifecycle notifications published by the aggregator.
    Session,
    /// All events (no filtering).
    All,
}

/// How far a notification travels before it reaches this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationScope {
    /// Published inside this process.
    Process,
    /// Relayed from a system-wide channel.
    System,
}

impl fmt::Display for NotificationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => f.write_str("process"),
            Self::System => f.write_str("system"),
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: EventTopic) -> Self {
        Self::topics(vec![topic])
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &StatusEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
