//! Outbound Ports (Driven Ports)
//!
//! Dependencies the aggregator needs from the outside world: the source of
//! truth for every domain, and the avatar cache it pokes after each auth
//! refresh.

use async_trait::async_trait;
use shared_types::{
    AuthStatus, GeneralStatus, PermissionStatus, QuotaSnapshot, ServiceRunSnapshot, SourceError,
};

/// Source of truth for every status domain (Driven Port).
///
/// Each query is independent and may be slow. Retries, if any, live
/// behind this trait.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current login state.
    async fn auth_status(&self) -> Result<AuthStatus, SourceError>;

    /// General status document, used for the display name.
    async fn general_status(&self) -> Result<GeneralStatus, SourceError>;

    /// Current background service state.
    async fn service_status(&self) -> Result<ServiceRunSnapshot, SourceError>;

    /// Current accessibility permission state.
    async fn permission_status(&self) -> Result<PermissionStatus, SourceError>;

    /// Current usage quota. `Ok(None)` when there is none to report.
    async fn quota_info(&self) -> Result<QuotaSnapshot, SourceError>;

    /// Drop any quota the source has cached. Called when auth resolves to
    /// logged out.
    async fn invalidate_quota(&self) {}
}

/// Avatar cache side channel.
///
/// Fire-and-forget: implementations must not block and report nothing back.
pub trait AvatarLoader: Send + Sync {
    /// Load (or clear, when `None`) the avatar for a user.
    fn load_avatar(&self, username: Option<&str>);
}

/// Avatar loader that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAvatarLoader;

impl AvatarLoader for NoOpAvatarLoader {
    fn load_avatar(&self, _username: Option<&str>) {}
}
