//! State actor that owns every domain snapshot.
//!
//! The actor task is the single writer of the four `watch` channels. It
//! receives updates from trackers over an `mpsc` channel and assigns them one
//! at a time, so within a domain writes are ordered by arrival and no
//! observer ever sees a torn value. Trackers do their slow source queries
//! elsewhere and only send the finished snapshot here.
//!
//! Public API: [`AggregatedState`] (cloneable read side). The write side,
//! [`StateHandle`], is internal to the crate.

use shared_types::{
    AggregatedSnapshot, AuthSnapshot, AuthStatus, PermissionStatus, QuotaSnapshot,
    ServiceRunSnapshot, StatusDomain,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::{ApplyOutcome, DomainUpdate};
use crate::error::AggregatorError;
use crate::metrics::Metrics;
use crate::ports::AvatarLoader;
use crate::service::tracker::Liveness;

/// Messages sent from trackers and the aggregator to the actor loop.
pub(crate) enum StateCommand {
    /// Assign a snapshot, unless the sending tracker has been disposed or
    /// a later-completed query of the same domain was already assigned.
    Apply {
        update: DomainUpdate,
        /// Per-domain completion order of the query that built `update`.
        sequence: u64,
        liveness: Liveness,
        reply: oneshot::Sender<ApplyOutcome>,
    },

    /// Copy all four snapshots in one turn.
    Snapshot {
        reply: oneshot::Sender<AggregatedSnapshot>,
    },

    /// Stop the loop. Observers keep the last values.
    Shutdown,
}

/// Read side of the aggregated status.
///
/// Cloning is cheap; every clone observes the same channels.
#[derive(Debug, Clone)]
pub struct AggregatedState {
    auth: watch::Receiver<AuthSnapshot>,
    service_run: watch::Receiver<ServiceRunSnapshot>,
    permission: watch::Receiver<PermissionStatus>,
    quota: watch::Receiver<QuotaSnapshot>,
}

impl AggregatedState {
    pub fn auth(&self) -> watch::Receiver<AuthSnapshot> {
        self.auth.clone()
    }

    pub fn service_run(&self) -> watch::Receiver<ServiceRunSnapshot> {
        self.service_run.clone()
    }

    pub fn permission(&self) -> watch::Receiver<PermissionStatus> {
        self.permission.clone()
    }

    pub fn quota(&self) -> watch::Receiver<QuotaSnapshot> {
        self.quota.clone()
    }

    /// Current value of every domain.
    ///
    /// Each field is a whole snapshot, but the four are read one after the
    /// other. Use `StatusAggregator::snapshot` for a copy taken in a single
    /// actor turn.
    pub fn current(&self) -> AggregatedSnapshot {
        AggregatedSnapshot {
            auth: self.auth.borrow().clone(),
            service_run: self.service_run.borrow().clone(),
            permission: *self.permission.borrow(),
            quota: self.quota.borrow().clone(),
        }
    }
}

/// Cloneable write handle to the actor.
#[derive(Clone)]
pub(crate) struct StateHandle {
    tx: mpsc::Sender<StateCommand>,
}

impl StateHandle {
    /// Send an update and wait until the actor has handled it.
    pub(crate) async fn apply(
        &self,
        update: DomainUpdate,
        sequence: u64,
        liveness: Liveness,
    ) -> Result<ApplyOutcome, AggregatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Apply {
                update,
                sequence,
                liveness,
                reply,
            })
            .await
            .map_err(|_| AggregatorError::ActorStopped)?;
        rx.await.map_err(|_| AggregatorError::ActorStopped)
    }

    pub(crate) async fn snapshot(&self) -> Result<AggregatedSnapshot, AggregatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StateCommand::Snapshot { reply })
            .await
            .map_err(|_| AggregatorError::ActorStopped)?;
        rx.await.map_err(|_| AggregatorError::ActorStopped)
    }

    pub(crate) async fn shutdown(&self) -> Result<(), AggregatorError> {
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| AggregatorError::ActorStopped)
    }
}

/// Spawn the actor on the current runtime.
pub(crate) fn spawn_state_actor(
    mailbox_capacity: usize,
    avatar: Arc<dyn AvatarLoader>,
    metrics: Arc<Metrics>,
) -> (StateHandle, AggregatedState, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
    let (auth_tx, auth) = watch::channel(AuthSnapshot::default());
    let (service_run_tx, service_run) = watch::channel(ServiceRunSnapshot::default());
    let (permission_tx, permission) = watch::channel(PermissionStatus::default());
    let (quota_tx, quota) = watch::channel(QuotaSnapshot::default());

    let actor = StateActor {
        auth: auth_tx,
        service_run: service_run_tx,
        permission: permission_tx,
        quota: quota_tx,
        avatar,
        metrics,
        last_applied: HashMap::new(),
    };
    let task = tokio::spawn(actor.run(rx));

    let state = AggregatedState {
        auth,
        service_run,
        permission,
        quota,
    };
    (StateHandle { tx }, state, task)
}

struct StateActor {
    auth: watch::Sender<AuthSnapshot>,
    service_run: watch::Sender<ServiceRunSnapshot>,
    permission: watch::Sender<PermissionStatus>,
    quota: watch::Sender<QuotaSnapshot>,
    avatar: Arc<dyn AvatarLoader>,
    metrics: Arc<Metrics>,
    /// Sequence of the last assigned update, per domain.
    last_applied: HashMap<StatusDomain, u64>,
}

impl StateActor {
    async fn run(mut self, mut rx: mpsc::Receiver<StateCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                StateCommand::Apply {
                    update,
                    sequence,
                    liveness,
                    reply,
                } => {
                    let domain = update.domain();
                    let last = self.last_applied.get(&domain).copied().unwrap_or(0);
                    let outcome = if !liveness.is_alive() {
                        self.metrics.record_stale_update();
                        debug!(%domain, "Dropped update from disposed tracker");
                        ApplyOutcome::dropped()
                    } else if sequence <= last {
                        self.metrics.record_superseded_update();
                        debug!(%domain, sequence, last, "Dropped update superseded by a newer query");
                        ApplyOutcome::superseded()
                    } else {
                        self.last_applied.insert(domain, sequence);
                        self.apply(update)
                    };
                    // Caller may have gone away; the assignment stands either way.
                    let _ = reply.send(outcome);
                }
                StateCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                StateCommand::Shutdown => break,
            }
        }
        debug!("State actor stopped");
    }

    fn apply(&self, update: DomainUpdate) -> ApplyOutcome {
        let domain = update.domain();
        let mut outcome = ApplyOutcome {
            applied: true,
            ..ApplyOutcome::default()
        };

        match update {
            DomainUpdate::Auth(snapshot) => {
                let logged_out = snapshot.status == AuthStatus::NotLoggedIn;
                let was_logged_out = self.auth.borrow().status == AuthStatus::NotLoggedIn;
                let username = snapshot.username.clone();

                // Quota goes first so no observer sees a logged-out user with a quota.
                if logged_out {
                    outcome.quota_cleared = self.quota.send_if_modified(|q| q.take().is_some());
                    if outcome.quota_cleared {
                        self.metrics.record_quota_invalidation();
                    }
                }
                outcome.changed = self.auth.send_if_modified(|current| replace(current, snapshot));
                outcome.logged_out = logged_out && !was_logged_out;

                self.avatar.load_avatar(username.as_deref());
                self.metrics.record_avatar_request();
            }
            DomainUpdate::ServiceRun(snapshot) => {
                outcome.changed = self
                    .service_run
                    .send_if_modified(|current| replace(current, snapshot));
            }
            DomainUpdate::Permission(status) => {
                outcome.changed = self
                    .permission
                    .send_if_modified(|current| replace(current, status));
            }
            DomainUpdate::Quota(quota) => {
                outcome.changed = self.quota.send_if_modified(|current| replace(current, quota));
            }
        }

        self.metrics.record_applied(outcome.changed);
        debug!(
            domain = %domain,
            changed = outcome.changed,
            quota_cleared = outcome.quota_cleared,
            "Snapshot applied"
        );
        outcome
    }

    fn snapshot(&self) -> AggregatedSnapshot {
        AggregatedSnapshot {
            auth: self.auth.borrow().clone(),
            service_run: self.service_run.borrow().clone(),
            permission: *self.permission.borrow(),
            quota: self.quota.borrow().clone(),
        }
    }
}

/// Assign `new` if it differs; report whether observers should be notified.
fn replace<T: PartialEq>(slot: &mut T, new: T) -> bool {
    if *slot == new {
        return false;
    }
    *slot = new;
    true
}
