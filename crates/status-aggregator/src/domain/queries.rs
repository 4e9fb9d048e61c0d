//! Per-domain queries.
//!
//! A `DomainQuery` knows three things about its domain: which notifications
//! should trigger a refresh, how to build a snapshot from the source, and
//! what to show when the source fails.

use async_trait::async_trait;
use shared_bus::{EventTopic, NotificationScope};
use shared_types::{
    AuthSnapshot, AuthStatus, PermissionStatus, ServiceRunSnapshot, SourceError, StatusDomain,
};
use std::sync::Arc;
use tracing::warn;

use super::update::DomainUpdate;
use crate::ports::StatusSource;

/// A notification that should trigger a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Bus the notification arrives on.
    pub scope: NotificationScope,
    /// Topic to listen for.
    pub topic: EventTopic,
}

const SERVICE_STATUS_CHANGED: Trigger = Trigger {
    scope: NotificationScope::Process,
    topic: EventTopic::ServiceStatus,
};

const AUTH_STATUS_CHANGED: Trigger = Trigger {
    scope: NotificationScope::System,
    topic: EventTopic::AuthStatus,
};

/// Refresh strategy for one status domain.
#[async_trait]
pub trait DomainQuery: Send + Sync {
    /// Domain this query refreshes.
    fn domain(&self) -> StatusDomain;

    /// Notifications that trigger a refresh.
    fn triggers(&self) -> &'static [Trigger];

    /// Query the source and build a new snapshot.
    async fn fetch(&self, source: &dyn StatusSource) -> Result<DomainUpdate, SourceError>;

    /// Snapshot to assign when `fetch` fails.
    fn fallback(&self, error: &SourceError) -> DomainUpdate;
}

/// Build the query for a domain.
#[must_use]
pub fn query_for(domain: StatusDomain) -> Arc<dyn DomainQuery> {
    match domain {
        StatusDomain::Auth => Arc::new(AuthQuery),
        StatusDomain::ServiceRun => Arc::new(ServiceRunQuery),
        StatusDomain::Permission => Arc::new(PermissionQuery),
        StatusDomain::Quota => Arc::new(QuotaQuery),
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Auth refresh: login state plus display name.
///
/// Listens on both the service bus and the system bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthQuery;

#[async_trait]
impl DomainQuery for AuthQuery {
    fn domain(&self) -> StatusDomain {
        StatusDomain::Auth
    }

    fn triggers(&self) -> &'static [Trigger] {
        &[SERVICE_STATUS_CHANGED, AUTH_STATUS_CHANGED]
    }

    async fn fetch(&self, source: &dyn StatusSource) -> Result<DomainUpdate, SourceError> {
        let status = source.auth_status().await?;

        // A general status failure only loses the display name.
        let username = match source.general_status().await {
            Ok(general) => general.user_name,
            Err(e) => {
                warn!(domain = %StatusDomain::Auth, error = %e, "General status unavailable");
                None
            }
        };

        if status == AuthStatus::NotLoggedIn {
            source.invalidate_quota().await;
        }

        Ok(DomainUpdate::Auth(AuthSnapshot {
            status,
            username,
            message: None,
        }))
    }

    fn fallback(&self, error: &SourceError) -> DomainUpdate {
        DomainUpdate::Auth(AuthSnapshot::error(error.to_string()))
    }
}

// =============================================================================
// SERVICE RUN
// =============================================================================

/// Background service refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceRunQuery;

#[async_trait]
impl DomainQuery for ServiceRunQuery {
    fn domain(&self) -> StatusDomain {
        StatusDomain::ServiceRun
    }

    fn triggers(&self) -> &'static [Trigger] {
        &[SERVICE_STATUS_CHANGED]
    }

    async fn fetch(&self, source: &dyn StatusSource) -> Result<DomainUpdate, SourceError> {
        Ok(DomainUpdate::ServiceRun(source.service_status().await?))
    }

    fn fallback(&self, error: &SourceError) -> DomainUpdate {
        DomainUpdate::ServiceRun(ServiceRunSnapshot::error(error.to_string()))
    }
}

// =============================================================================
// PERMISSION
// =============================================================================

/// Accessibility permission refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionQuery;

#[async_trait]
impl DomainQuery for PermissionQuery {
    fn domain(&self) -> StatusDomain {
        StatusDomain::Permission
    }

    fn triggers(&self) -> &'static [Trigger] {
        &[SERVICE_STATUS_CHANGED]
    }

    async fn fetch(&self, source: &dyn StatusSource) -> Result<DomainUpdate, SourceError> {
        Ok(DomainUpdate::Permission(source.permission_status().await?))
    }

    fn fallback(&self, _error: &SourceError) -> DomainUpdate {
        DomainUpdate::Permission(PermissionStatus::Unknown)
    }
}

// =============================================================================
// QUOTA
// =============================================================================

/// Usage quota refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuotaQuery;

#[async_trait]
impl DomainQuery for QuotaQuery {
    fn domain(&self) -> StatusDomain {
        StatusDomain::Quota
    }

    fn triggers(&self) -> &'static [Trigger] {
        &[SERVICE_STATUS_CHANGED]
    }

    async fn fetch(&self, source: &dyn StatusSource) -> Result<DomainUpdate, SourceError> {
        Ok(DomainUpdate::Quota(source.quota_info().await?))
    }

    fn fallback(&self, _error: &SourceError) -> DomainUpdate {
        DomainUpdate::Quota(None)
    }
}
