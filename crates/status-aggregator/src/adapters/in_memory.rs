//! In-memory adapters.
//!
//! `InMemoryStatusSource` answers every query from values set by the caller
//! and can fail or hold individual domains. `RecordingAvatarLoader` keeps
//! every avatar request. Both are used by tests and local demos.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    AuthStatus, GeneralStatus, PermissionStatus, QuotaSnapshot, ServiceRunSnapshot, SourceError,
    StatusDomain,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::ports::{AvatarLoader, StatusSource};

#[derive(Debug)]
struct SourceState {
    auth: Result<AuthStatus, SourceError>,
    general: Result<GeneralStatus, SourceError>,
    service: Result<ServiceRunSnapshot, SourceError>,
    permission: Result<PermissionStatus, SourceError>,
    quota: Result<QuotaSnapshot, SourceError>,
    quota_invalidations: usize,
    calls: HashMap<StatusDomain, usize>,
}

impl Default for SourceState {
    fn default() -> Self {
        Self {
            auth: Ok(AuthStatus::Unknown),
            general: Ok(GeneralStatus::default()),
            service: Ok(ServiceRunSnapshot::default()),
            permission: Ok(PermissionStatus::Unknown),
            quota: Ok(None),
            quota_invalidations: 0,
            calls: HashMap::new(),
        }
    }
}

/// Status source backed by values held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStatusSource {
    state: Mutex<SourceState>,
    gates: Mutex<HashMap<StatusDomain, Arc<Semaphore>>>,
}

impl InMemoryStatusSource {
    /// Source answering `Unknown`/empty for every domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_auth(&self, status: AuthStatus) {
        self.state.lock().auth = Ok(status);
    }

    pub fn set_user_name(&self, user_name: Option<&str>) {
        self.state.lock().general = Ok(GeneralStatus {
            user_name: user_name.map(str::to_string),
        });
    }

    pub fn set_service(&self, snapshot: ServiceRunSnapshot) {
        self.state.lock().service = Ok(snapshot);
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        self.state.lock().permission = Ok(status);
    }

    pub fn set_quota(&self, quota: QuotaSnapshot) {
        self.state.lock().quota = Ok(quota);
    }

    /// Make every query of `domain` fail with `error` until a value is set.
    pub fn fail(&self, domain: StatusDomain, error: SourceError) {
        let mut state = self.state.lock();
        match domain {
            StatusDomain::Auth => state.auth = Err(error),
            StatusDomain::ServiceRun => state.service = Err(error),
            StatusDomain::Permission => state.permission = Err(error),
            StatusDomain::Quota => state.quota = Err(error),
        }
    }

    /// Make the general status query fail.
    pub fn fail_general(&self, error: SourceError) {
        self.state.lock().general = Err(error);
    }

    /// Block queries of `domain` until `release` is called.
    ///
    /// Blocked queries read their value after they are released.
    pub fn hold(&self, domain: StatusDomain) {
        self.gates.lock().insert(domain, Arc::new(Semaphore::new(0)));
    }

    /// Let held queries of `domain` complete.
    pub fn release(&self, domain: StatusDomain) {
        if let Some(gate) = self.gates.lock().remove(&domain) {
            gate.close();
        }
    }

    /// Number of queries started for `domain`.
    #[must_use]
    pub fn calls(&self, domain: StatusDomain) -> usize {
        self.state.lock().calls.get(&domain).copied().unwrap_or(0)
    }

    /// Number of `invalidate_quota` calls.
    #[must_use]
    pub fn quota_invalidations(&self) -> usize {
        self.state.lock().quota_invalidations
    }

    async fn enter(&self, domain: StatusDomain) {
        *self.state.lock().calls.entry(domain).or_insert(0) += 1;

        let gate = self.gates.lock().get(&domain).cloned();
        if let Some(gate) = gate {
            // Closing the semaphore is the release signal
            let _ = gate.acquire().await;
        }
    }
}

#[async_trait]
impl StatusSource for InMemoryStatusSource {
    async fn auth_status(&self) -> Result<AuthStatus, SourceError> {
        self.enter(StatusDomain::Auth).await;
        self.state.lock().auth.clone()
    }

    async fn general_status(&self) -> Result<GeneralStatus, SourceError> {
        self.state.lock().general.clone()
    }

    async fn service_status(&self) -> Result<ServiceRunSnapshot, SourceError> {
        self.enter(StatusDomain::ServiceRun).await;
        self.state.lock().service.clone()
    }

    async fn permission_status(&self) -> Result<PermissionStatus, SourceError> {
        self.enter(StatusDomain::Permission).await;
        self.state.lock().permission.clone()
    }

    async fn quota_info(&self) -> Result<QuotaSnapshot, SourceError> {
        self.enter(StatusDomain::Quota).await;
        self.state.lock().quota.clone()
    }

    async fn invalidate_quota(&self) {
        let mut state = self.state.lock();
        state.quota_invalidations += 1;
        state.quota = Ok(None);
    }
}

/// Avatar loader that records every request.
#[derive(Debug, Default)]
pub struct RecordingAvatarLoader {
    requests: Mutex<Vec<Option<String>>>,
}

impl RecordingAvatarLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().clone()
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last(&self) -> Option<Option<String>> {
        self.requests.lock().last().cloned()
    }
}

impl AvatarLoader for RecordingAvatarLoader {
    fn load_avatar(&self, username: Option<&str>) {
        self.requests.lock().push(username.map(str::to_string));
    }
}
