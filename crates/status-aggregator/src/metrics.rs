//! Metrics hooks for refresh operations
//!
//! Counters shared by every tracker and the state actor. Cheap to update
//! from any task.
//!
//! ## Usage
//!
//! ```ignore
//! let snapshot = aggregator.metrics();
//! println!("{} refreshes applied", snapshot.refreshes_applied);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the aggregator.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Refreshes started (startup, notification or manual)
    pub refreshes_started: AtomicU64,
    /// Snapshots assigned by the state actor
    pub refreshes_applied: AtomicU64,
    /// Assignments that notified observers (value changed)
    pub snapshots_changed: AtomicU64,
    /// Source queries that failed and fell back
    pub query_failures: AtomicU64,
    /// Updates dropped because their tracker was disposed
    pub stale_updates_dropped: AtomicU64,
    /// Updates dropped because a later-completed query was already assigned
    pub updates_superseded: AtomicU64,
    /// Quota snapshots cleared by an auth refresh
    pub quota_invalidations: AtomicU64,
    /// Avatar load requests emitted
    pub avatar_requests: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_refresh_started(&self) {
        self.refreshes_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an assignment; `changed` when observers were notified.
    pub fn record_applied(&self, changed: bool) {
        self.refreshes_applied.fetch_add(1, Ordering::Relaxed);
        if changed {
            self.snapshots_changed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_query_failure(&self) {
        self.query_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_update(&self) {
        self.stale_updates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded_update(&self) {
        self.updates_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_quota_invalidation(&self) {
        self.quota_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_avatar_request(&self) {
        self.avatar_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refreshes_started: self.refreshes_started.load(Ordering::Relaxed),
            refreshes_applied: self.refreshes_applied.load(Ordering::Relaxed),
            snapshots_changed: self.snapshots_changed.load(Ordering::Relaxed),
            query_failures: self.query_failures.load(Ordering::Relaxed),
            stale_updates_dropped: self.stale_updates_dropped.load(Ordering::Relaxed),
            updates_superseded: self.updates_superseded.load(Ordering::Relaxed),
            quota_invalidations: self.quota_invalidations.load(Ordering::Relaxed),
            avatar_requests: self.avatar_requests.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub refreshes_started: u64,
    pub refreshes_applied: u64,
    pub snapshots_changed: u64,
    pub query_failures: u64,
    pub stale_updates_dropped: u64,
    pub updates_superseded: u64,
    pub quota_invalidations: u64,
    pub avatar_requests: u64,
}
