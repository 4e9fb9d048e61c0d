//! # Integration Tests
//!
//! Tests that the status crates work together over the shared buses.

pub mod flows;
pub mod runtime_flow;
