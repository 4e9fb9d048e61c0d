//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for presentation layers
//! - Driven Ports (outbound) - Sources of truth and side channels

pub mod inbound;
pub mod outbound;

pub use inbound::StatusObserverApi;
pub use outbound::{AvatarLoader, NoOpAvatarLoader, StatusSource};
