//! Domain Layer
//!
//! How each status domain turns source answers into snapshots, and the
//! update values handed to the state actor. No task spawning or channels
//! live here.

pub mod queries;
pub mod update;

pub use queries::{
    query_for, AuthQuery, DomainQuery, PermissionQuery, QuotaQuery, ServiceRunQuery, Trigger,
};
pub use update::{ApplyOutcome, DomainUpdate};
