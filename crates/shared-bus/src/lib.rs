//! # Shared Bus - Typed Status Notifications
//!
//! Local publish/subscribe channel on which "a status may have changed"
//! events arrive.
//!
//! ## Channels
//!
//! A process normally runs two buses:
//!
//! - the **service** bus, carrying `ServiceStatusChanged` from the
//!   background service connection,
//! - the **system** bus, carrying `AuthStatusChanged` relayed from outside
//!   the process.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Publisher   │                    │   Tracker    │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Events are matched by `EventTopic`, never by string name. Dropping a
//! `Subscription` (or the `EventStream` built from it) unregisters it.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, NotificationScope, StatusEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
