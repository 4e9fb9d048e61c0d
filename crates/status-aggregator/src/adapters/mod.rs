//! Adapters Layer
//!
//! Connects the aggregator to the outside world.
//!
//! ## Adapters
//!
//! - `NotificationBuses` - Wires trackers to the service and system buses
//! - `InMemoryStatusSource` - Status source backed by in-memory values
//! - `RecordingAvatarLoader` - Avatar loader that records requests

pub mod bus_adapter;
pub mod in_memory;

pub use bus_adapter::NotificationBuses;
pub use in_memory::{InMemoryStatusSource, RecordingAvatarLoader};
