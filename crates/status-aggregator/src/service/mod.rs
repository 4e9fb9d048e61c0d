//! Service Layer
//!
//! The state actor, the per-domain trackers, and the aggregator that owns
//! them.

pub mod aggregator;
pub mod state_actor;
pub mod tracker;

pub use aggregator::{AggregatorConfig, AggregatorDeps, StatusAggregator};
pub use state_actor::AggregatedState;
pub use tracker::{DomainTracker, TrackerSubscription};
