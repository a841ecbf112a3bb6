mod common;

use std::sync::Arc;
use std::time::Duration;

use aingine_application::{SessionState, StatusPoller};
use aingine_core::gateway::{HealthReport, SystemStatus};
use common::{MockGateway, locked, online};

const INTERVAL: Duration = Duration::from_secs(5);

fn poller(gateway: &Arc<MockGateway>) -> (Arc<SessionState>, StatusPoller) {
    let state = Arc::new(SessionState::new());
    let poller = StatusPoller::new(state.clone(), gateway.clone(), INTERVAL);
    (state, poller)
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[tokio::test]
async fn test_poll_once_applies_report() {
    let gateway = MockGateway::new();
    gateway.set_health(locked(Some("qwen-32b")));
    let (state, poller) = poller(&gateway);

    poller.poll_once().await;

    let snapshot = state.snapshot();
    assert_eq!(snapshot.system_status, SystemStatus::Online);
    assert_eq!(snapshot.current_model_id.as_deref(), Some("qwen-32b"));
    assert!(snapshot.gpu_locked);
}

#[tokio::test(start_paused = true)]
async fn test_first_probe_is_immediate_then_periodic() {
    let gateway = MockGateway::new();
    gateway.set_health(online(None));
    let (state, poller) = poller(&gateway);

    let handle = poller.start();
    advance(Duration::from_millis(1)).await;
    assert_eq!(gateway.health_calls(), 1);
    assert_eq!(state.snapshot().system_status, SystemStatus::Online);

    // Probes at 0s, 5s and 10s
    advance(Duration::from_secs(11)).await;
    assert_eq!(gateway.health_calls(), 3);
    assert!(handle.is_running());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_status_tracks_last_probe() {
    let gateway = MockGateway::new();
    gateway.set_health(online(Some("a")));
    let (state, poller) = poller(&gateway);
    let handle = poller.start();

    advance(Duration::from_millis(1)).await;
    assert_eq!(state.snapshot().current_model_id.as_deref(), Some("a"));

    gateway.set_health(HealthReport::offline());
    advance(INTERVAL).await;
    let snapshot = state.snapshot();
    assert_eq!(snapshot.system_status, SystemStatus::Offline);
    assert_eq!(snapshot.current_model_id, None);
    assert!(!snapshot.gpu_locked);

    gateway.set_health(locked(Some("b")));
    advance(INTERVAL).await;
    let snapshot = state.snapshot();
    assert_eq!(snapshot.system_status, SystemStatus::Online);
    assert_eq!(snapshot.current_model_id.as_deref(), Some("b"));
    assert!(snapshot.gpu_locked);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_polling() {
    let gateway = MockGateway::new();
    let (_state, poller) = poller(&gateway);

    let handle = poller.start();
    advance(Duration::from_millis(1)).await;
    handle.stop().await;

    let calls = gateway.health_calls();
    advance(INTERVAL * 10).await;
    assert_eq!(gateway.health_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_halts_polling() {
    let gateway = MockGateway::new();
    let (_state, poller) = poller(&gateway);

    let handle = poller.start();
    advance(Duration::from_millis(1)).await;
    drop(handle);
    advance(Duration::from_millis(1)).await;

    let calls = gateway.health_calls();
    advance(INTERVAL * 10).await;
    assert_eq!(gateway.health_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_slow_probes_never_overlap() {
    let gateway = MockGateway::new();
    gateway.set_health_delay(Duration::from_secs(12));
    let (_state, poller) = poller(&gateway);

    let handle = poller.start();
    advance(Duration::from_secs(59)).await;
    handle.stop().await;

    assert_eq!(gateway.max_probes_in_flight(), 1);
    // Each probe takes 12s, so at most five fit in 59s
    assert!(gateway.health_calls() <= 5);
}

#[tokio::test(start_paused = true)]
async fn test_probe_in_flight_at_stop_is_discarded() {
    let gateway = MockGateway::new();
    gateway.set_health(online(Some("a")));
    gateway.set_health_delay(Duration::from_secs(3));
    let (state, poller) = poller(&gateway);

    let handle = poller.start();
    advance(Duration::from_secs(1)).await;
    handle.stop().await;
    advance(Duration::from_secs(10)).await;

    assert_eq!(state.snapshot().system_status, SystemStatus::Offline);
    assert_eq!(state.snapshot().current_model_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_manual_poll_waits_for_loop_poll() {
    let gateway = MockGateway::new();
    gateway.set_health(online(Some("a")));
    gateway.set_health_delay(Duration::from_secs(3));
    let (state, poller) = poller(&gateway);

    let handle = poller.start();
    advance(Duration::from_secs(1)).await;

    // The loop's first health check is still in flight
    poller.poll_once().await;
    assert_eq!(gateway.max_probes_in_flight(), 1);
    assert!(gateway.health_calls() >= 2);
    assert_eq!(state.snapshot().current_model_id.as_deref(), Some("a"));

    handle.stop().await;
}
