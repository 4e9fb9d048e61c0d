//! Status source backed by the JSON document the background service writes.
//!
//! ```json
//! {
//!   "auth": "logged_in",
//!   "user_name": "alice",
//!   "service": { "status": "normal", "busy": false, "message": "" },
//!   "permission": "granted",
//!   "quota": { "plan": "individual", "chat": {...}, ... }
//! }
//! ```
//!
//! The file is re-read on every query. A missing file or a missing section
//! is `Unavailable`; unparsable JSON is `Malformed`.

use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{
    AuthStatus, GeneralStatus, PermissionStatus, QuotaInfo, QuotaSnapshot, ServiceRunSnapshot,
    SourceError,
};
use status_aggregator::StatusSource;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusDocument {
    auth: Option<AuthStatus>,
    user_name: Option<String>,
    service: Option<ServiceRunSnapshot>,
    permission: Option<PermissionStatus>,
    quota: Option<QuotaInfo>,
}

/// Reads status from a JSON file.
#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StatusDocument, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    SourceError::Unavailable(format!("{} not found", self.path.display()))
                }
                _ => SourceError::Unavailable(format!("{}: {e}", self.path.display())),
            })?;
        serde_json::from_str(&raw).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

fn section<T>(value: Option<T>, name: &str) -> Result<T, SourceError> {
    value.ok_or_else(|| SourceError::Unavailable(format!("no {name} section")))
}

#[async_trait]
impl StatusSource for FileStatusSource {
    async fn auth_status(&self) -> Result<AuthStatus, SourceError> {
        section(self.read().await?.auth, "auth")
    }

    async fn general_status(&self) -> Result<GeneralStatus, SourceError> {
        Ok(GeneralStatus {
            user_name: self.read().await?.user_name,
        })
    }

    async fn service_status(&self) -> Result<ServiceRunSnapshot, SourceError> {
        section(self.read().await?.service, "service")
    }

    async fn permission_status(&self) -> Result<PermissionStatus, SourceError> {
        section(self.read().await?.permission, "permission")
    }

    async fn quota_info(&self) -> Result<QuotaSnapshot, SourceError> {
        Ok(self.read().await?.quota)
    }

    async fn invalidate_quota(&self) {
        // Nothing cached; the next quota query reads the file again
        debug!(path = %self.path.display(), "Quota invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ServiceRunStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn document(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_every_section() {
        let file = document(
            r#"{
                "auth": "logged_in",
                "user_name": "alice",
                "service": { "status": "in_progress", "busy": true, "message": "indexing" },
                "permission": "not_granted",
                "quota": {
                    "plan": "individual",
                    "chat": { "entitlement": 300, "remaining": 120 },
                    "completions": { "entitlement": 0, "remaining": 0, "unlimited": true },
                    "premium_interactions": { "entitlement": 50, "remaining": 0 },
                    "reset_at": "2026-11-01T00:00:00Z"
                }
            }"#,
        );
        let source = FileStatusSource::new(file.path());

        assert_eq!(source.auth_status().await, Ok(AuthStatus::LoggedIn));
        assert_eq!(
            source.general_status().await.unwrap().user_name.as_deref(),
            Some("alice")
        );
        let service = source.service_status().await.unwrap();
        assert_eq!(service.status, ServiceRunStatus::InProgress);
        assert!(service.busy);
        assert_eq!(source.permission_status().await, Ok(PermissionStatus::NotGranted));

        let quota = source.quota_info().await.unwrap().unwrap();
        assert_eq!(quota.plan, "individual");
        assert!(quota.completions.unlimited);
        assert!(quota.reset_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_sections() {
        let file = document(r#"{ "auth": "not_logged_in" }"#);
        let source = FileStatusSource::new(file.path());

        assert_eq!(source.auth_status().await, Ok(AuthStatus::NotLoggedIn));
        assert_eq!(source.general_status().await, Ok(GeneralStatus::default()));
        assert_eq!(source.quota_info().await, Ok(None));
        assert_eq!(
            source.service_status().await,
            Err(SourceError::Unavailable("no service section".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileStatusSource::new(dir.path().join("absent.json"));

        assert!(matches!(
            source.auth_status().await,
            Err(SourceError::Unavailable(msg)) if msg.ends_with("not found")
        ));
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let file = document("{ not json");
        let source = FileStatusSource::new(file.path());

        assert!(matches!(
            source.permission_status().await,
            Err(SourceError::Malformed(_))
        ));

        let file = document(r#"{ "auth": "sleeping" }"#);
        let source = FileStatusSource::new(file.path());
        assert!(matches!(source.auth_status().await, Err(SourceError::Malformed(_))));
    }
}
