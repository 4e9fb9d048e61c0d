//! # Shared Types Crate
//!
//! This crate contains the status snapshots for every tracked domain and
//! the error type returned by status sources.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate status types are defined here.
//! - **Immutable Snapshots**: A snapshot is a value. It is replaced, never
//!   patched, so observers can never see a half-written one.
//! - **Explicit Fallbacks**: Every domain has a well-defined "don't know"
//!   value used at startup and when its source fails.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
