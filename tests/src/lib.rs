//! # Status Hub Test Suite
//!
//! Cross-crate flows that exercise the aggregator through its public API and
//! the event buses only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs         # Aggregator + buses + in-memory source
//!     └── runtime_flow.rs  # Runtime + file-backed source
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p status-tests
//! cargo test -p status-tests integration::flows
//! ```

pub mod integration;
