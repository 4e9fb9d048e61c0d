//! # Status Entities
//!
//! Defines the snapshot held for every tracked status domain.
//!
//! ## Domains
//!
//! - **Auth**: `AuthSnapshot` (login state and display name)
//! - **Service Run**: `ServiceRunSnapshot` (background service state)
//! - **Permission**: `PermissionStatus` (accessibility permission)
//! - **Quota**: `QuotaSnapshot` (usage quota, absent when logged out)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// DOMAINS
// =============================================================================

/// One independently tracked status category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDomain {
    /// Authentication state.
    Auth,
    /// Background service run state.
    ServiceRun,
    /// Accessibility permission state.
    Permission,
    /// Usage quota.
    Quota,
}

impl StatusDomain {
    /// Order in which domains are populated at startup.
    pub const STARTUP_ORDER: [StatusDomain; 4] = [
        StatusDomain::Auth,
        StatusDomain::ServiceRun,
        StatusDomain::Permission,
        StatusDomain::Quota,
    ];

    /// Stable name used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::ServiceRun => "service_run",
            Self::Permission => "permission",
            Self::Quota => "quota",
        }
    }
}

impl fmt::Display for StatusDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Login state reported by the auth source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Not queried yet.
    #[default]
    Unknown,
    /// A user is logged in.
    LoggedIn,
    /// No user is logged in.
    NotLoggedIn,
    /// The auth source could not be queried.
    Error,
}

/// Last-known authentication state.
///
/// `username` is only expected when `status` is `LoggedIn`. The source of
/// truth does not enforce this, so consumers should not rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthSnapshot {
    /// Resolved login state.
    pub status: AuthStatus,
    /// Display name of the logged-in user.
    pub username: Option<String>,
    /// Human-readable detail (set on failure).
    pub message: Option<String>,
}

impl AuthSnapshot {
    /// Snapshot used when the auth source fails.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AuthStatus::Error,
            username: None,
            message: Some(message.into()),
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.status == AuthStatus::LoggedIn
    }
}

/// General status document, used for the user's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GeneralStatus {
    /// Display name of the current user, if any.
    pub user_name: Option<String>,
}

// =============================================================================
// SERVICE RUN
// =============================================================================

/// Run state of the background service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRunStatus {
    /// Not queried yet.
    #[default]
    Unknown,
    /// Running normally.
    Normal,
    /// Working on a request.
    InProgress,
    /// Running with a non-fatal problem.
    Warning,
    /// Failed or unreachable.
    Error,
    /// Installed but not running.
    Inactive,
}

/// Last-known background service state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceRunSnapshot {
    /// Resolved run state.
    pub status: ServiceRunStatus,
    /// Whether the service is busy.
    pub busy: bool,
    /// Human-readable detail.
    pub message: String,
}

impl ServiceRunSnapshot {
    /// Snapshot used when the service source fails.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ServiceRunStatus::Error,
            busy: false,
            message: message.into(),
        }
    }
}

// =============================================================================
// PERMISSION
// =============================================================================

/// Accessibility permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Not queried yet, or the source failed.
    #[default]
    Unknown,
    /// Permission granted.
    Granted,
    /// Permission denied or not requested.
    NotGranted,
}

// =============================================================================
// QUOTA
// =============================================================================

/// Usage of one quota bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuotaBucket {
    /// Total allowance for the period.
    pub entitlement: u64,
    /// Allowance left in the period.
    pub remaining: u64,
    /// Bucket has no limit.
    #[serde(default)]
    pub unlimited: bool,
}

impl QuotaBucket {
    /// Percentage of the allowance still available, 0.0 to 100.0.
    #[must_use]
    pub fn percent_remaining(&self) -> f64 {
        if self.unlimited {
            return 100.0;
        }
        if self.entitlement == 0 {
            return 0.0;
        }
        let remaining = self.remaining.min(self.entitlement);
        (remaining as f64 / self.entitlement as f64) * 100.0
    }
}

/// Usage quota for the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuotaInfo {
    /// Plan name, e.g. "individual".
    pub plan: String,
    /// Chat messages.
    pub chat: QuotaBucket,
    /// Code completions.
    pub completions: QuotaBucket,
    /// Premium model interactions.
    pub premium_interactions: QuotaBucket,
    /// When the buckets reset.
    pub reset_at: Option<DateTime<Utc>>,
}

/// Quota snapshot. `None` when logged out or not fetched yet.
pub type QuotaSnapshot = Option<QuotaInfo>;

// =============================================================================
// AGGREGATE
// =============================================================================

/// Point-in-time copy of every domain snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AggregatedSnapshot {
    /// Authentication state.
    pub auth: AuthSnapshot,
    /// Background service state.
    pub service_run: ServiceRunSnapshot,
    /// Accessibility permission state.
    pub permission: PermissionStatus,
    /// Usage quota.
    pub quota: QuotaSnapshot,
}
