//! # Status Aggregator
//!
//! Keeps one observable, always-current view of four independently refreshed
//! status domains: authentication, service run state, permission and quota.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Per-domain refresh rules, no I/O
//!   - `DomainQuery`: How a domain queries the source and what it falls back to
//!   - `DomainUpdate`: A finished snapshot on its way to the state actor
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `StatusObserverApi`: Driving port (presentation layers)
//!   - `StatusSource`: Driven port (the background service)
//!   - `AvatarLoader`: Driven port (avatar cache side channel)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `StatusAggregator`: Owns the trackers, implements `StatusObserverApi`
//!   - `DomainTracker`: Refreshes one domain
//!   - `AggregatedState`: Read side of the four snapshots
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `NotificationBuses`: Service and system event buses
//!   - `InMemoryStatusSource`, `RecordingAvatarLoader`: In-memory ports
//!
//! ## Invariants
//!
//! - Every snapshot is written by the state actor only; observers never see
//!   a torn value.
//! - A refresh never fails: source errors become the domain's fallback
//!   snapshot.
//! - An auth snapshot of `NotLoggedIn` empties the quota in the same turn.
//! - Once a tracker's subscription is disposed its snapshot never changes
//!   again, including from queries already in flight.
//!
//! ## Usage Example
//!
//! ```ignore
//! use status_aggregator::{
//!     AggregatorConfig, AggregatorDeps, NotificationBuses, StatusAggregator,
//!     StatusObserverApi,
//! };
//!
//! let buses = NotificationBuses::new(256);
//! let aggregator = StatusAggregator::start(
//!     AggregatorDeps { source, avatar, buses: buses.clone() },
//!     AggregatorConfig::default(),
//! );
//! aggregator.initialized().await?;
//!
//! let mut auth = aggregator.auth();
//! while auth.changed().await.is_ok() {
//!     println!("{:?}", *auth.borrow());
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

/// Updates the state actor buffers before trackers wait for room.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

// Re-exports for convenience
pub use adapters::{InMemoryStatusSource, NotificationBuses, RecordingAvatarLoader};
pub use domain::{ApplyOutcome, DomainQuery, DomainUpdate};
pub use error::AggregatorError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ports::{AvatarLoader, NoOpAvatarLoader, StatusObserverApi, StatusSource};
pub use service::{
    AggregatedState, AggregatorConfig, AggregatorDeps, DomainTracker, StatusAggregator,
    TrackerSubscription,
};
