//! Integration tests for the connection manager.
//!
//! These drive the public manager API against mock backends, covering pool
//! sizing, retries, rate limiting, health reporting and teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use poolgate::config::ManagerConfig;
use poolgate::error::Error;
use poolgate::manager::ConnectionManager;
use poolgate::port::{Event, NotifierRegistry};
use poolgate::testkit;
use poolgate::testkit::client::{MockBackend, MockClient, ScriptedOperation};
use poolgate::testkit::notifier::RecordingNotifier;
use tokio::time::Instant;

fn manager(config: ManagerConfig, backend: &MockBackend) -> Arc<ConnectionManager<MockClient>> {
    Arc::new(ConnectionManager::new(config, backend.factory()))
}

fn observed_manager(
    config: ManagerConfig,
    backend: &MockBackend,
    notifier: &RecordingNotifier,
) -> Arc<ConnectionManager<MockClient>> {
    Arc::new(
        ConnectionManager::new(config, backend.factory()).with_notifier(Arc::new(notifier.clone())),
    )
}

// ---------------------------------------------------------------------------
// Pool sizing
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn initialize_creates_exactly_pool_size_clients() {
    let backend = MockBackend::new();
    let mgr = manager(testkit::config::manager(5), &backend);

    mgr.initialize().await.unwrap();

    let metrics = mgr.metrics();
    assert_eq!(backend.constructed(), 5);
    assert_eq!(metrics.total_connections, 5);
    assert_eq!(metrics.active_connections, 0);

    mgr.cleanup().await;
}

// ---------------------------------------------------------------------------
// Retries
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn always_failing_operation_is_invoked_max_retries_times() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(2);
    config.max_retries = 4;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let op = ScriptedOperation::failing_times(u32::MAX);
    let err = mgr.execute("caller", |_c| op.run()).await.unwrap_err();

    assert_eq!(op.calls(), 4);
    assert_eq!(err.to_string(), "attempt 4 failed");
    assert_eq!(mgr.metrics().error_count, 4);
    assert_eq!(mgr.metrics().active_connections, 0);

    mgr.cleanup().await;
}

#[tokio::test(start_paused = true)]
async fn operation_succeeding_on_kth_attempt_is_not_called_again() {
    let backend = MockBackend::new();
    let mgr = manager(testkit::config::manager(2), &backend);
    mgr.initialize().await.unwrap();

    let op = ScriptedOperation::failing_times(1);
    let value = mgr.execute("caller", |_c| op.run()).await.unwrap();

    assert_eq!(value, 2);
    assert_eq!(op.calls(), 2);
    let metrics = mgr.metrics();
    assert_eq!(metrics.request_count, 1);
    assert_eq!(metrics.error_count, 1);

    mgr.cleanup().await;
}

#[tokio::test(start_paused = true)]
async fn slow_operation_times_out_on_every_attempt() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(1);
    config.max_retries = 2;
    config.operation_timeout_ms = 200;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let op = ScriptedOperation::failing_times(0).with_latency(Duration::from_secs(1));
    let err = mgr.execute("caller", |_c| op.run()).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 200 }));
    assert_eq!(op.calls(), 2);
    assert_eq!(op.completed(), 0);
    assert_eq!(mgr.metrics().active_connections, 0);

    mgr.cleanup().await;
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn concurrent_retrying_calls_share_a_small_pool() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(2);
    config.max_retries = 3;
    config.retry_delay_ms = 100;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let peak = Arc::new(AtomicUsize::new(0));
    let ops: Vec<_> = (0..3)
        .map(|_| ScriptedOperation::failing_times(2).with_latency(Duration::from_millis(50)))
        .collect();

    let calls = ops.iter().enumerate().map(|(i, op)| {
        let mgr = Arc::clone(&mgr);
        let peak = Arc::clone(&peak);
        let identifier = format!("caller-{i}");
        async move {
            mgr.execute(&identifier, |_c| {
                peak.fetch_max(mgr.metrics().active_connections, Ordering::SeqCst);
                op.run()
            })
            .await
        }
    });
    let results = join_all(calls).await;

    for result in &results {
        assert_eq!(*result.as_ref().unwrap(), 3);
    }
    assert!(ops.iter().all(|op| op.calls() == 3));
    assert!(peak.load(Ordering::SeqCst) <= 2);

    let metrics = mgr.metrics();
    assert_eq!(metrics.request_count, 3);
    assert_eq!(metrics.error_count, 6);
    assert_eq!(metrics.active_connections, 0);

    mgr.cleanup().await;
}

#[tokio::test(start_paused = true)]
async fn saturated_pool_fails_with_pool_exhausted() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(1);
    config.max_retries = 1;
    config.acquire_timeout_ms = 200;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let slow = ScriptedOperation::failing_times(0).with_latency(Duration::from_millis(500));
    let fast = ScriptedOperation::failing_times(0);
    let (held, starved) = tokio::join!(
        mgr.execute("a", |_c| slow.run()),
        mgr.execute("b", |_c| fast.run()),
    );

    assert_eq!(held.unwrap(), 1);
    assert!(matches!(starved, Err(Error::PoolExhausted { .. })));
    assert_eq!(fast.calls(), 0);
    assert_eq!(mgr.metrics().failed_connections, 1);

    mgr.cleanup().await;
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn burst_beyond_rate_limit_is_rejected() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(3);
    config.rate_limit_requests = 5;
    config.rate_limit_window_ms = 1000;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let op = ScriptedOperation::failing_times(0);
    let mut outcomes = Vec::new();
    for _ in 0..6 {
        outcomes.push(mgr.execute("burst", |_c| op.run()).await);
    }

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 5);
    assert!(matches!(
        outcomes.last(),
        Some(Err(Error::RateLimitExceeded { identifier })) if identifier == "burst"
    ));
    assert_eq!(op.calls(), 5);

    // Another caller is unaffected, and the window eventually resets.
    assert!(mgr.execute("other", |_c| op.run()).await.is_ok());
    tokio::time::advance(Duration::from_millis(1001)).await;
    assert!(mgr.execute("burst", |_c| op.run()).await.is_ok());

    mgr.cleanup().await;
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn health_tracks_backend_over_time() {
    let backend = MockBackend::new();
    let mgr = manager(testkit::config::manager(2), &backend);

    assert!(!mgr.is_healthy());
    mgr.initialize().await.unwrap();
    assert!(mgr.is_healthy());
    assert!(mgr.perform_health_check().await.unwrap());

    backend.set_healthy(false);
    assert!(!mgr.perform_health_check().await.unwrap());
    // Still within two intervals of the last passing probe.
    assert!(mgr.is_healthy());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!mgr.is_healthy());

    backend.set_healthy(true);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(mgr.is_healthy());
    assert!(mgr.metrics().health_checks_failed >= 3);

    mgr.cleanup().await;
    assert!(!mgr.is_healthy());
}

#[tokio::test(start_paused = true)]
async fn slow_probe_counts_as_failure() {
    let backend = MockBackend::new();
    backend.set_probe_latency(Duration::from_secs(5));
    let mut config = testkit::config::manager(1);
    config.operation_timeout_ms = 100;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    assert!(!mgr.perform_health_check().await.unwrap());
    assert_eq!(mgr.metrics().active_connections, 0);

    mgr.cleanup().await;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn lifecycle_events_reach_every_registered_notifier() {
    let backend = MockBackend::new();
    let first = RecordingNotifier::new();
    let second = RecordingNotifier::new();
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(first.clone()));
    registry.register(Box::new(second.clone()));

    let mgr = ConnectionManager::new(testkit::config::manager(2), backend.factory())
        .with_notifier(Arc::new(registry));
    mgr.initialize().await.unwrap();
    mgr.cleanup().await;

    let expected = vec![
        Event::HealthCheckPassed,
        Event::Initialized { pool_size: 2 },
        Event::Cleanup,
    ];
    assert_eq!(first.events(), expected);
    assert_eq!(second.events(), expected);
}

#[tokio::test(start_paused = true)]
async fn failed_probe_is_notified_with_reason() {
    let backend = MockBackend::new();
    let notifier = RecordingNotifier::new();
    let mgr = observed_manager(testkit::config::manager(1), &backend, &notifier);
    mgr.initialize().await.unwrap();
    notifier.clear();

    backend.set_healthy(false);
    mgr.perform_health_check().await.unwrap();

    assert_eq!(
        notifier.events(),
        vec![Event::HealthCheckFailed {
            reason: "mock backend unavailable".into()
        }]
    );

    mgr.cleanup().await;
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn cleanup_waits_for_in_flight_operation() {
    let backend = MockBackend::new();
    let notifier = RecordingNotifier::new();
    let mgr = observed_manager(testkit::config::manager(1), &backend, &notifier);
    mgr.initialize().await.unwrap();

    let op = ScriptedOperation::failing_times(0).with_latency(Duration::from_millis(500));
    let in_flight = {
        let mgr = Arc::clone(&mgr);
        let op = op.clone();
        tokio::spawn(async move { mgr.execute("caller", |_c| op.run()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mgr.metrics().active_connections, 1);

    let started = Instant::now();
    mgr.cleanup().await;

    assert!(started.elapsed() >= Duration::from_millis(400));
    assert_eq!(op.completed(), 1);
    assert_eq!(in_flight.await.unwrap().unwrap(), 1);
    assert_eq!(notifier.count(|e| *e == Event::Cleanup), 1);

    let after = ScriptedOperation::failing_times(0);
    let err = mgr.execute("caller", |_c| after.run()).await.unwrap_err();
    assert!(matches!(err, Error::NotInitialized));
    assert_eq!(after.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cleanup_gives_up_on_stuck_operation_after_drain_timeout() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(1);
    config.operation_timeout_ms = 60_000;
    config.drain_timeout_ms = 300;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let stuck = ScriptedOperation::failing_times(0).with_latency(Duration::from_secs(30));
    let in_flight = {
        let mgr = Arc::clone(&mgr);
        let stuck = stuck.clone();
        tokio::spawn(async move { mgr.execute("caller", |_c| stuck.run()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let started = Instant::now();
    mgr.cleanup().await;

    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(300));
    assert!(waited < Duration::from_secs(30));
    assert!(!mgr.is_initialized());
    in_flight.abort();
}

#[tokio::test(start_paused = true)]
async fn operation_outliving_its_lifecycle_does_not_touch_new_metrics() {
    let backend = MockBackend::new();
    let mut config = testkit::config::manager(1);
    config.operation_timeout_ms = 5_000;
    config.drain_timeout_ms = 100;
    let mgr = manager(config, &backend);
    mgr.initialize().await.unwrap();

    let stale = ScriptedOperation::failing_times(0).with_latency(Duration::from_millis(1_000));
    let in_flight = {
        let mgr = Arc::clone(&mgr);
        let stale = stale.clone();
        tokio::spawn(async move { mgr.execute("caller", |_c| stale.run()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    mgr.cleanup().await;
    mgr.initialize().await.unwrap();
    assert_eq!(in_flight.await.unwrap().unwrap(), 1);

    let metrics = mgr.metrics();
    assert_eq!(metrics.request_count, 0);
    assert_eq!(metrics.error_count, 0);
    assert_eq!(metrics.average_response_time_ms, 0.0);
    assert_eq!(metrics.active_connections, 0);
    assert_eq!(metrics.total_connections, 1);

    mgr.cleanup().await;
}
