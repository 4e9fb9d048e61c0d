//! Error types for the status aggregator

use thiserror::Error;

/// Errors from the aggregator's control surface.
///
/// Refresh failures are not errors: they become fallback snapshots. These
/// variants only describe a stopped or half-started aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("State actor stopped")]
    ActorStopped,

    #[error("Initialization aborted before all domains were populated")]
    InitializationAborted,
}
