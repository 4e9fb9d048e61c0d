//! # Runtime Flow
//!
//! The runtime reading a status document from disk, polling it and
//! following the background service through a logout.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use shared_types::{AuthStatus, PermissionStatus, ServiceRunStatus};
    use status_aggregator::{RecordingAvatarLoader, StatusObserverApi};
    use status_runtime::adapters::FileStatusSource;
    use status_runtime::config::RuntimeConfig;
    use status_runtime::StatusRuntime;

    fn write_status(path: &Path, document: serde_json::Value) {
        // Write then rename so the poller never reads a half-written file
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, document.to_string()).unwrap();
        std::fs::rename(&tmp, path).unwrap();
    }

    fn logged_in() -> serde_json::Value {
        serde_json::json!({
            "auth": "logged_in",
            "user_name": "alice",
            "service": { "status": "normal", "busy": false, "message": "ready" },
            "permission": "granted",
            "quota": {
                "plan": "individual",
                "chat": { "entitlement": 300, "remaining": 299 },
                "completions": { "entitlement": 0, "remaining": 0, "unlimited": true },
                "premium_interactions": { "entitlement": 50, "remaining": 50 }
            }
        })
    }

    fn config(path: &Path) -> RuntimeConfig {
        RuntimeConfig {
            status_file: path.to_path_buf(),
            poll_interval: Duration::from_millis(25),
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_runtime_follows_status_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        write_status(&path, logged_in());

        let avatar = Arc::new(RecordingAvatarLoader::new());
        let runtime = StatusRuntime::start_with(
            config(&path),
            Arc::new(FileStatusSource::new(&path)),
            avatar.clone(),
        )
        .await
        .unwrap();
        let aggregator = runtime.aggregator();

        let snapshot = aggregator.snapshot().await.unwrap();
        assert_eq!(snapshot.auth.username.as_deref(), Some("alice"));
        assert_eq!(snapshot.service_run.status, ServiceRunStatus::Normal);
        assert_eq!(snapshot.permission, PermissionStatus::Granted);
        assert_eq!(snapshot.quota.map(|q| q.plan).as_deref(), Some("individual"));
        assert_eq!(avatar.last(), Some(Some("alice".to_string())));

        // Background service logs the user out; the next poll picks it up
        write_status(
            &path,
            serde_json::json!({
                "auth": "not_logged_in",
                "service": { "status": "inactive", "busy": false, "message": "" },
                "permission": "granted"
            }),
        );
        let mut auth = aggregator.auth();
        timeout(
            Duration::from_secs(2),
            auth.wait_for(|a| a.status == AuthStatus::NotLoggedIn),
        )
        .await
        .expect("logout not observed")
        .unwrap();
        assert!(aggregator.quota().borrow().is_none());

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_document_degrades_to_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");

        let runtime = StatusRuntime::start_with(
            config(&path),
            Arc::new(FileStatusSource::new(&path)),
            Arc::new(RecordingAvatarLoader::new()),
        )
        .await
        .unwrap();
        let aggregator = runtime.aggregator();

        let snapshot = aggregator.snapshot().await.unwrap();
        assert_eq!(snapshot.auth.status, AuthStatus::Error);
        assert_eq!(snapshot.service_run.status, ServiceRunStatus::Error);
        assert_eq!(snapshot.permission, PermissionStatus::Unknown);
        assert!(snapshot.quota.is_none());

        // The document appears later and is picked up without a restart
        write_status(&path, logged_in());
        let mut auth = aggregator.auth();
        timeout(Duration::from_secs(2), auth.wait_for(|a| a.is_logged_in()))
            .await
            .expect("recovery not observed")
            .unwrap();

        runtime.shutdown().await.unwrap();
    }
}
