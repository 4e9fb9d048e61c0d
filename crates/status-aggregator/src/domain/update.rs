//! Snapshot updates and the result of applying them.

use shared_types::{
    AuthSnapshot, PermissionStatus, QuotaSnapshot, ServiceRunSnapshot, StatusDomain,
};

/// A freshly built snapshot for one domain, ready to be assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainUpdate {
    Auth(AuthSnapshot),
    ServiceRun(ServiceRunSnapshot),
    Permission(PermissionStatus),
    Quota(QuotaSnapshot),
}

impl DomainUpdate {
    /// Domain this update belongs to.
    #[must_use]
    pub fn domain(&self) -> StatusDomain {
        match self {
            Self::Auth(_) => StatusDomain::Auth,
            Self::ServiceRun(_) => StatusDomain::ServiceRun,
            Self::Permission(_) => StatusDomain::Permission,
            Self::Quota(_) => StatusDomain::Quota,
        }
    }
}

/// What the state actor did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyOutcome {
    /// The update was assigned (the tracker was still alive).
    pub applied: bool,
    /// The assigned value differed from the previous one, so observers
    /// were notified.
    pub changed: bool,
    /// An auth update emptied a non-empty quota snapshot.
    pub quota_cleared: bool,
    /// An auth update moved the session from any other state to logged out.
    pub logged_out: bool,
    /// A query that completed later had already been assigned, so this
    /// older result was discarded.
    pub superseded: bool,
}

impl ApplyOutcome {
    /// Outcome for an update that was dropped.
    #[must_use]
    pub fn dropped() -> Self {
        Self::default()
    }

    /// Outcome for an update that lost to a later-completed query.
    #[must_use]
    pub fn superseded() -> Self {
        Self {
            superseded: true,
            ..Self::default()
        }
    }
}
