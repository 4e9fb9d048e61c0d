//! Log-based presentation of the aggregated status.
//!
//! `LoggingPresenter` stands where a menu bar or status window would: it
//! observes every domain and writes one line per change.

use shared_types::{AggregatedSnapshot, AuthStatus};
use status_aggregator::{AggregatedState, AvatarLoader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Logs every aggregated-state change until shutdown.
pub struct LoggingPresenter {
    state: AggregatedState,
}

impl LoggingPresenter {
    pub fn new(state: AggregatedState) -> Self {
        Self { state }
    }

    /// Observe until `shutdown` flips to `true` or the aggregator stops.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut auth = self.state.auth();
            let mut service_run = self.state.service_run();
            let mut permission = self.state.permission();
            let mut quota = self.state.quota();

            info!(status = %summarize(&self.state.current()), "Status");
            loop {
                let changed = tokio::select! {
                    r = auth.changed() => r,
                    r = service_run.changed() => r,
                    r = permission.changed() => r,
                    r = quota.changed() => r,
                    _ = shutdown.changed() => break,
                };
                if changed.is_err() {
                    break;
                }
                info!(status = %summarize(&self.state.current()), "Status changed");
            }
            debug!("Presenter stopped");
        })
    }
}

/// One-line rendering of a snapshot.
pub fn summarize(snapshot: &AggregatedSnapshot) -> String {
    let auth = match (&snapshot.auth.status, &snapshot.auth.username) {
        (AuthStatus::LoggedIn, Some(name)) => format!("logged in as {name}"),
        (AuthStatus::LoggedIn, None) => "logged in".to_string(),
        (AuthStatus::NotLoggedIn, _) => "logged out".to_string(),
        (AuthStatus::Error, _) => format!(
            "auth error ({})",
            snapshot.auth.message.as_deref().unwrap_or("unknown")
        ),
        (AuthStatus::Unknown, _) => "auth unknown".to_string(),
    };
    let service = format!(
        "service {:?}{}",
        snapshot.service_run.status,
        if snapshot.service_run.busy { " (busy)" } else { "" }
    )
    .to_lowercase();
    let quota = match &snapshot.quota {
        Some(q) => format!("quota {} chat {:.0}%", q.plan, q.chat.percent_remaining()),
        None => "no quota".to_string(),
    };
    format!(
        "{auth}; {service}; permission {:?}; {quota}",
        snapshot.permission
    )
}

/// Avatar loader that only logs the request.
#[derive(Debug, Default)]
pub struct LoggingAvatarLoader;

impl AvatarLoader for LoggingAvatarLoader {
    fn load_avatar(&self, username: Option<&str>) {
        match username {
            Some(name) => debug!(user = name, "Avatar requested"),
            None => debug!("Avatar cleared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        AuthSnapshot, PermissionStatus, QuotaBucket, QuotaInfo, ServiceRunSnapshot,
        ServiceRunStatus,
    };

    #[test]
    fn test_summarize_logged_in() {
        let snapshot = AggregatedSnapshot {
            auth: AuthSnapshot {
                status: AuthStatus::LoggedIn,
                username: Some("alice".into()),
                message: None,
            },
            service_run: ServiceRunSnapshot {
                status: ServiceRunStatus::InProgress,
                busy: true,
                message: String::new(),
            },
            permission: PermissionStatus::Granted,
            quota: Some(QuotaInfo {
                plan: "individual".into(),
                chat: QuotaBucket {
                    entitlement: 200,
                    remaining: 50,
                    unlimited: false,
                },
                ..QuotaInfo::default()
            }),
        };

        assert_eq!(
            summarize(&snapshot),
            "logged in as alice; service inprogress (busy); permission Granted; quota individual chat 25%"
        );
    }

    #[test]
    fn test_summarize_defaults() {
        assert_eq!(
            summarize(&AggregatedSnapshot::default()),
            "auth unknown; service unknown; permission Unknown; no quota"
        );
    }

    #[test]
    fn test_summarize_auth_error() {
        let snapshot = AggregatedSnapshot {
            auth: AuthSnapshot::error("Source unavailable: down"),
            ..AggregatedSnapshot::default()
        };
        assert!(summarize(&snapshot).starts_with("auth error (Source unavailable: down)"));
    }
}
