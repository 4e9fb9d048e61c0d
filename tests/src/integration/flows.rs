//! # Aggregator Flows
//!
//! Tests that the status aggregator, the shared buses and a status source
//! work together:
//!
//! 1. **Startup**: every domain holds exactly one query result
//! 2. **Service notifications**: every domain refreshes, the last completed query wins
//! 3. **System notifications**: only auth refreshes
//! 4. **Logout**: quota is cleared in the same turn, even with a quota query in flight
//! 5. **Failures**: never surface, always become fallback snapshots
//! 6. **Disposal**: a disposed domain never changes again

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    use parking_lot::Mutex;
    use shared_bus::{EventFilter, EventPublisher, EventTopic, StatusEvent};
    use shared_types::{
        AuthSnapshot, AuthStatus, GeneralStatus, PermissionStatus, QuotaBucket, QuotaInfo,
        QuotaSnapshot, ServiceRunSnapshot, ServiceRunStatus, SourceError, StatusDomain,
    };
    use status_aggregator::{
        AggregatorConfig, AggregatorDeps, InMemoryStatusSource, NotificationBuses,
        RecordingAvatarLoader, StatusAggregator, StatusObserverApi, StatusSource,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Hub {
        source: Arc<InMemoryStatusSource>,
        avatar: Arc<RecordingAvatarLoader>,
        buses: NotificationBuses,
        aggregator: StatusAggregator,
    }

    async fn start(source: InMemoryStatusSource) -> Hub {
        let source = Arc::new(source);
        let avatar = Arc::new(RecordingAvatarLoader::new());
        let buses = NotificationBuses::new(64);
        let aggregator = StatusAggregator::start(
            AggregatorDeps {
                source: source.clone(),
                avatar: avatar.clone(),
                buses: buses.clone(),
            },
            AggregatorConfig::default(),
        );
        timeout(Duration::from_secs(2), aggregator.initialized())
            .await
            .expect("startup timed out")
            .expect("startup aborted");
        Hub {
            source,
            avatar,
            buses,
            aggregator,
        }
    }

    fn quota(plan: &str) -> QuotaSnapshot {
        Some(QuotaInfo {
            plan: plan.to_string(),
            chat: QuotaBucket {
                entitlement: 300,
                remaining: 150,
                unlimited: false,
            },
            ..QuotaInfo::default()
        })
    }

    fn service(message: &str) -> ServiceRunSnapshot {
        ServiceRunSnapshot {
            status: ServiceRunStatus::Normal,
            busy: false,
            message: message.to_string(),
        }
    }

    async fn wait_until<T, F>(mut rx: watch::Receiver<T>, predicate: F) -> T
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("condition not reached")
            .expect("aggregator stopped")
            .clone()
    }

    /// Answers service queries from a script, one entry per query.
    struct ScriptedServiceSource {
        script: Mutex<VecDeque<ServiceRunSnapshot>>,
    }

    #[async_trait::async_trait]
    impl StatusSource for ScriptedServiceSource {
        async fn auth_status(&self) -> Result<AuthStatus, SourceError> {
            Ok(AuthStatus::LoggedIn)
        }

        async fn general_status(&self) -> Result<GeneralStatus, SourceError> {
            Ok(GeneralStatus::default())
        }

        async fn service_status(&self) -> Result<ServiceRunSnapshot, SourceError> {
            self.script
                .lock()
                .pop_front()
                .ok_or_else(|| SourceError::Unavailable("script exhausted".into()))
        }

        async fn permission_status(&self) -> Result<PermissionStatus, SourceError> {
            Ok(PermissionStatus::Granted)
        }

        async fn quota_info(&self) -> Result<QuotaSnapshot, SourceError> {
            Ok(None)
        }
    }

    /// Numbers service query results in the order the queries complete.
    #[derive(Default)]
    struct CountingServiceSource {
        completed: AtomicU64,
    }

    impl CountingServiceSource {
        fn completed(&self) -> u64 {
            self.completed.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl StatusSource for CountingServiceSource {
        async fn auth_status(&self) -> Result<AuthStatus, SourceError> {
            Ok(AuthStatus::LoggedIn)
        }

        async fn general_status(&self) -> Result<GeneralStatus, SourceError> {
            Ok(GeneralStatus::default())
        }

        async fn service_status(&self) -> Result<ServiceRunSnapshot, SourceError> {
            // Uneven work so overlapping queries finish out of start order
            let spins = self.completed() % 7;
            for _ in 0..spins {
                tokio::task::yield_now().await;
            }
            let n = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(service(&format!("query {n}")))
        }

        async fn permission_status(&self) -> Result<PermissionStatus, SourceError> {
            Ok(PermissionStatus::Granted)
        }

        async fn quota_info(&self) -> Result<QuotaSnapshot, SourceError> {
            Ok(None)
        }
    }

    // =============================================================================
    // STARTUP
    // =============================================================================

    #[tokio::test]
    async fn test_startup_reflects_one_query_per_domain() {
        let source = InMemoryStatusSource::new();
        source.set_auth(AuthStatus::LoggedIn);
        source.set_user_name(Some("dana"));
        source.set_service(service("ready"));
        source.set_permission(PermissionStatus::NotGranted);
        source.set_quota(quota("business"));

        let hub = start(source).await;
        let snapshot = hub.aggregator.snapshot().await.unwrap();

        assert_eq!(
            snapshot.auth,
            AuthSnapshot {
                status: AuthStatus::LoggedIn,
                username: Some("dana".into()),
                message: None,
            }
        );
        assert_eq!(snapshot.service_run, service("ready"));
        assert_eq!(snapshot.permission, PermissionStatus::NotGranted);
        assert_eq!(snapshot.quota, quota("business"));
        for domain in StatusDomain::STARTUP_ORDER {
            assert_eq!(hub.source.calls(domain), 1, "{domain} queried more than once");
        }
    }

    // =============================================================================
    // NOTIFICATIONS
    // =============================================================================

    #[tokio::test]
    async fn test_service_notifications_last_write_wins() {
        let script: VecDeque<ServiceRunSnapshot> =
            (0..=5).map(|i| service(&format!("tick {i}"))).collect();
        let buses = NotificationBuses::new(64);
        let aggregator = StatusAggregator::start(
            AggregatorDeps {
                source: Arc::new(ScriptedServiceSource {
                    script: Mutex::new(script),
                }),
                avatar: Arc::new(RecordingAvatarLoader::new()),
                buses: buses.clone(),
            },
            AggregatorConfig::default(),
        );
        aggregator.initialized().await.unwrap();
        assert_eq!(aggregator.service_run().borrow().message, "tick 0");

        for i in 1..=5 {
            buses.service.publish(StatusEvent::service_status_changed()).await;
            let expected = format!("tick {i}");
            wait_until(aggregator.service_run(), |s| s.message == expected).await;
        }

        assert_eq!(aggregator.service_run().borrow().message, "tick 5");
        aggregator.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_notification_burst_keeps_last_completed_query() {
        const BURST: u64 = 200;

        let source = Arc::new(CountingServiceSource::default());
        let buses = NotificationBuses::new(512);
        let aggregator = StatusAggregator::start(
            AggregatorDeps {
                source: source.clone(),
                avatar: Arc::new(RecordingAvatarLoader::new()),
                buses: buses.clone(),
            },
            AggregatorConfig::default(),
        );
        aggregator.initialized().await.unwrap();

        for _ in 0..BURST {
            buses.service.publish(StatusEvent::service_status_changed()).await;
        }

        // Every query has completed and every result reached the actor
        timeout(Duration::from_secs(5), async {
            loop {
                if source.completed() == BURST + 1 {
                    let m = aggregator.metrics();
                    let settled =
                        m.refreshes_applied + m.updates_superseded + m.stale_updates_dropped;
                    if settled == m.refreshes_started {
                        break;
                    }
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("burst never settled");

        assert_eq!(
            aggregator.service_run().borrow().message,
            format!("query {}", BURST + 1)
        );
        aggregator.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_system_notification_refreshes_auth_only() {
        let hub = start(InMemoryStatusSource::new()).await;

        hub.source.set_auth(AuthStatus::LoggedIn);
        hub.source.set_permission(PermissionStatus::Granted);
        hub.buses
            .system
            .publish(StatusEvent::auth_status_changed())
            .await;

        wait_until(hub.aggregator.auth(), |a| a.is_logged_in()).await;
        assert_eq!(hub.source.calls(StatusDomain::Permission), 1);
        assert_eq!(hub.source.calls(StatusDomain::Quota), 1);
    }

    // =============================================================================
    // AUTH AND QUOTA
    // =============================================================================

    #[tokio::test]
    async fn test_logged_in_user_requests_avatar() {
        let source = InMemoryStatusSource::new();
        source.set_auth(AuthStatus::LoggedIn);
        source.set_user_name(Some("alice"));

        let hub = start(source).await;

        assert_eq!(
            *hub.aggregator.auth().borrow(),
            AuthSnapshot {
                status: AuthStatus::LoggedIn,
                username: Some("alice".into()),
                message: None,
            }
        );
        assert_eq!(hub.avatar.last(), Some(Some("alice".to_string())));
    }

    #[tokio::test]
    async fn test_logout_clears_quota() {
        let source = InMemoryStatusSource::new();
        source.set_auth(AuthStatus::LoggedIn);
        source.set_quota(quota("individual"));
        let hub = start(source).await;
        assert!(hub.aggregator.quota().borrow().is_some());

        let mut session = hub
            .buses
            .service
            .subscribe(EventFilter::topic(EventTopic::Session));

        hub.source.set_auth(AuthStatus::NotLoggedIn);
        hub.buses
            .system
            .publish(StatusEvent::auth_status_changed())
            .await;

        let auth = wait_until(hub.aggregator.auth(), |a| a.status == AuthStatus::NotLoggedIn).await;
        assert_eq!(auth.username, None);
        assert!(hub.aggregator.quota().borrow().is_none());
        assert_eq!(hub.aggregator.metrics().quota_invalidations, 1);

        let event = timeout(Duration::from_secs(1), session.recv())
            .await
            .expect("no logout event")
            .expect("bus closed");
        assert!(matches!(event, StatusEvent::AuthLoggedOut { .. }));
    }

    #[tokio::test]
    async fn test_logout_wins_over_quota_query_in_flight() {
        let source = InMemoryStatusSource::new();
        source.set_auth(AuthStatus::LoggedIn);
        source.set_quota(quota("individual"));
        let hub = Arc::new(start(source).await);

        // Quota refresh blocks inside the source
        hub.source.hold(StatusDomain::Quota);
        let in_flight = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move { hub.aggregator.refresh(StatusDomain::Quota).await })
        };
        timeout(Duration::from_secs(1), async {
            while hub.source.calls(StatusDomain::Quota) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("quota query never started");

        // Observers never see a logged-out user with a quota
        let mut auth = hub.aggregator.auth();
        let quota_rx = hub.aggregator.quota();
        hub.source.set_auth(AuthStatus::NotLoggedIn);
        hub.aggregator.refresh(StatusDomain::Auth).await.unwrap();
        assert!(auth.has_changed().unwrap());
        assert_eq!(auth.borrow_and_update().status, AuthStatus::NotLoggedIn);
        assert!(quota_rx.borrow().is_none());

        // The held query reads the source after the logout invalidated it
        hub.source.release(StatusDomain::Quota);
        in_flight.await.unwrap().unwrap();

        assert!(hub.aggregator.quota().borrow().is_none());
        assert_eq!(hub.source.quota_invalidations(), 1);
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_failures_become_fallback_snapshots() {
        let source = InMemoryStatusSource::new();
        source.set_auth(AuthStatus::LoggedIn);
        source.set_service(service("ready"));
        source.set_permission(PermissionStatus::Granted);
        source.set_quota(quota("individual"));
        let hub = start(source).await;

        let down = SourceError::Unavailable("connection refused".into());
        for domain in StatusDomain::STARTUP_ORDER {
            hub.source.fail(domain, down.clone());
        }
        for domain in StatusDomain::STARTUP_ORDER {
            assert_eq!(hub.aggregator.refresh(domain).await, Ok(()));
        }

        let snapshot = hub.aggregator.snapshot().await.unwrap();
        assert_eq!(snapshot.auth, AuthSnapshot::error(down.to_string()));
        assert_eq!(snapshot.service_run, ServiceRunSnapshot::error(down.to_string()));
        assert_eq!(snapshot.permission, PermissionStatus::Unknown);
        assert_eq!(snapshot.quota, None);
        assert_eq!(hub.aggregator.metrics().query_failures, 4);
    }

    #[tokio::test]
    async fn test_user_name_failure_keeps_auth() {
        let source = InMemoryStatusSource::new();
        source.set_auth(AuthStatus::LoggedIn);
        source.fail_general(SourceError::Malformed("truncated".into()));

        let hub = start(source).await;

        let auth = hub.aggregator.auth().borrow().clone();
        assert_eq!(auth.status, AuthStatus::LoggedIn);
        assert_eq!(auth.username, None);
        assert_eq!(hub.avatar.last(), Some(None));
    }

    // =============================================================================
    // DISPOSAL
    // =============================================================================

    #[tokio::test]
    async fn test_disposed_domain_never_changes() {
        let hub = start(InMemoryStatusSource::new()).await;
        assert!(hub.aggregator.dispose_subscription(StatusDomain::Quota));

        for i in 0..3 {
            hub.source.set_quota(quota(&format!("plan {i}")));
            hub.source.set_service(service(&format!("tick {i}")));
            hub.buses
                .service
                .publish(StatusEvent::service_status_changed())
                .await;
            let expected = format!("tick {i}");
            wait_until(hub.aggregator.service_run(), |s| s.message == expected).await;
        }
        hub.aggregator.refresh(StatusDomain::Quota).await.unwrap();

        assert!(hub.aggregator.quota().borrow().is_none());
        assert_eq!(hub.source.calls(StatusDomain::Quota), 1);
    }

    #[tokio::test]
    async fn test_shutdown_keeps_last_values() {
        let source = InMemoryStatusSource::new();
        source.set_permission(PermissionStatus::Granted);
        let hub = start(source).await;
        let state = hub.aggregator.state();

        hub.aggregator.shutdown().await.unwrap();
        hub.source.set_permission(PermissionStatus::NotGranted);
        hub.buses
            .service
            .publish(StatusEvent::service_status_changed())
            .await;

        assert_eq!(state.current().permission, PermissionStatus::Granted);
    }
}
