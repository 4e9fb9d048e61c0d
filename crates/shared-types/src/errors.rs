//! # Error Types
//!
//! Defines error types used across crates.

use thiserror::Error;

/// Errors returned by a status source query.
///
/// These never reach observers: the tracker that issued the query maps
/// them to the domain's fallback snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source could not be reached.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with something that could not be parsed.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The source rejected the query.
    #[error("Query rejected: {0}")]
    Rejected(String),
}
