#![allow(clippy::unwrap_used)]
// End-to-end tests for `Dashboard`: wiremock serves the REST backend, a
// local tokio-tungstenite server plays the notification stream.

use std::time::Duration;

use futures_util::SinkExt;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use robodash_core::{
    ConnectionState, CoreError, Dashboard, DashboardConfig, IndicatorState, LogLevel,
};

const WAIT: Duration = Duration::from_secs(5);
const WINDOW: Duration = Duration::from_millis(400);
const RECONNECT: Duration = Duration::from_millis(150);

type Conns = mpsc::UnboundedReceiver<WebSocketStream<TcpStream>>;

// ── Helpers ─────────────────────────────────────────────────────────

async fn ws_server() -> (Url, Conns) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(tcp).await {
                if tx.send(ws).is_err() {
                    break;
                }
            }
        }
    });

    let url = Url::parse(&format!("ws://{addr}/ws/ble-notifications")).unwrap();
    (url, rx)
}

async fn accept(conns: &mut Conns) -> WebSocketStream<TcpStream> {
    tokio::time::timeout(WAIT, conns.recv())
        .await
        .expect("timed out waiting for stream connection")
        .unwrap()
}

async fn setup() -> (MockServer, Dashboard, Conns) {
    let server = MockServer::start().await;
    let (stream_url, conns) = ws_server().await;

    let mut config = DashboardConfig::new(Url::parse(&server.uri()).unwrap());
    config.stream_url = Some(stream_url);
    config.obstacle_window = WINDOW;
    config.reconnect_delay = RECONNECT;
    config.telemetry_interval = Duration::from_millis(100);
    config.totals_interval = Duration::from_millis(100);

    let dashboard = Dashboard::new(config).unwrap();
    (server, dashboard, conns)
}

async fn mount_ack(server: &MockServer, route: &str) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

async fn wait_for_state(dashboard: &Dashboard, want: ConnectionState) {
    let mut rx = dashboard.watch_connection();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == want))
        .await
        .expect("timed out waiting for connection state")
        .unwrap();
}

async fn wait_for_indicators(dashboard: &Dashboard, pred: impl Fn(&IndicatorState) -> bool) {
    let mut rx = dashboard.watch_indicators();
    tokio::time::timeout(WAIT, rx.wait_for(|s| pred(s)))
        .await
        .expect("timed out waiting for indicators")
        .unwrap();
}

async fn send(ws: &mut WebSocketStream<TcpStream>, body: serde_json::Value) {
    ws.send(Message::text(body.to_string())).await.unwrap();
}

// ── Notification pipeline ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_obstacle_notification_flags_critical_then_clears() {
    let (server, dashboard, mut conns) = setup().await;
    mount_ack(&server, "/api/ble/connect").await;
    dashboard.start().await;

    dashboard.connect_robot().await.unwrap();
    let mut robot = accept(&mut conns).await;
    wait_for_state(&dashboard, ConnectionState::Connected).await;

    send(
        &mut robot,
        json!({ "type": "ble_notification", "text": "EVENT:OBSTACLE_DETECTED" }),
    )
    .await;

    wait_for_indicators(&dashboard, IndicatorState::critical).await;
    let log = dashboard.log().recent();
    assert!(log.iter().any(|e| e.level == LogLevel::Error && e.message.contains("OBSTACLE")));
    assert!(log.iter().any(|e| e.message == "BLE NOTI: EVENT:OBSTACLE_DETECTED"));

    wait_for_indicators(&dashboard, |s| !s.critical()).await;

    dashboard.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_messages_apply_in_arrival_order() {
    let (server, dashboard, mut conns) = setup().await;
    mount_ack(&server, "/api/ble/connect").await;
    dashboard.start().await;

    dashboard.connect_robot().await.unwrap();
    let mut robot = accept(&mut conns).await;

    send(&mut robot, json!({ "type": "ble_notification", "text": "event:auto_mode" })).await;
    robot.send(Message::text("not json")).await.unwrap();
    send(&mut robot, json!({ "type": "ble_notification", "text": "event:headlights_on" })).await;
    send(&mut robot, json!({ "type": "ble_notification", "text": "event:manual_mode" })).await;

    wait_for_indicators(&dashboard, |s| s.manual && s.headlights).await;
    let state = dashboard.indicators();
    assert!(!state.auto);

    // The malformed frame was logged and the connection kept.
    assert!(dashboard
        .log()
        .recent()
        .iter()
        .any(|e| e.message.starts_with("Stream parse error")));
    assert_eq!(dashboard.connection_state(), ConnectionState::Connected);

    dashboard.shutdown().await;
}

// ── Connection lifecycle ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_close_reconnects() {
    let (server, dashboard, mut conns) = setup().await;
    mount_ack(&server, "/api/ble/connect").await;
    dashboard.start().await;

    dashboard.connect_robot().await.unwrap();
    let mut first = accept(&mut conns).await;
    wait_for_state(&dashboard, ConnectionState::Connected).await;

    first.close(None).await.unwrap();
    let _second = accept(&mut conns).await;
    wait_for_state(&dashboard, ConnectionState::Connected).await;

    dashboard.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_suppresses_reconnect() {
    let (server, dashboard, mut conns) = setup().await;
    mount_ack(&server, "/api/ble/connect").await;
    mount_ack(&server, "/api/ble/disconnect").await;
    dashboard.start().await;

    dashboard.connect_robot().await.unwrap();
    let _robot = accept(&mut conns).await;
    wait_for_state(&dashboard, ConnectionState::Connected).await;

    dashboard.disconnect_robot().await.unwrap();
    assert_eq!(dashboard.connection_state(), ConnectionState::Disconnected);

    let again = tokio::time::timeout(RECONNECT * 4, conns.recv()).await;
    assert!(again.is_err(), "stream reconnected after explicit disconnect");

    dashboard.shutdown().await;
}

#[tokio::test]
async fn test_failed_connect_does_not_open_stream() {
    let (server, dashboard, mut conns) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/connect"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "detail": { "success": false, "message": "Robot introuvable" }
        })))
        .mount(&server)
        .await;

    let result = dashboard.connect_robot().await;
    assert!(matches!(&result, Err(CoreError::Rejected { message }) if message == "Robot introuvable"));
    assert_eq!(dashboard.connection_state(), ConnectionState::Disconnected);
    assert!(dashboard
        .log()
        .recent()
        .iter()
        .any(|e| e.level == LogLevel::Error && e.message == "Error: Robot introuvable"));

    let attempt = tokio::time::timeout(Duration::from_millis(300), conns.recv()).await;
    assert!(attempt.is_err());
}

// ── Telemetry polling ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pollers_fill_metrics_and_proximity() {
    let (server, dashboard, _conns) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "speed_pwm": 128,
                "dist_traveled_cm": 250,
                "distance_cm": 12.0,
                "mode": "auto"
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/total-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "total_distance_m": 152.4,
            "total_uptime_hours": 3.5,
            "total_obstacles": 17
        })))
        .mount(&server)
        .await;

    dashboard.start().await;

    let mut metrics = dashboard.watch_metrics();
    tokio::time::timeout(
        WAIT,
        metrics.wait_for(|m| m.speed.is_some() && m.total_distance.is_some()),
    )
    .await
    .expect("timed out waiting for metrics")
    .unwrap();

    let snapshot = dashboard.metrics();
    assert_eq!(snapshot.speed.as_deref(), Some("50%"));
    assert_eq!(snapshot.session_distance.as_deref(), Some("2.50 m"));
    assert_eq!(snapshot.total_distance.as_deref(), Some("152.4 m"));

    let state = dashboard.indicators();
    assert!(state.auto);
    assert!(state.obstacle.proximity && state.critical());

    dashboard.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_poll_failures_are_skipped() {
    let (server, dashboard, _conns) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    dashboard.start().await;
    tokio::time::sleep(Duration::from_millis(350)).await;

    // Several failed ticks later the tiles are still empty and the tasks
    // still stop cleanly.
    assert!(dashboard.metrics().speed.is_none());
    let requests = server.received_requests().await.unwrap_or_default();
    let polls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/telemetry/latest")
        .count();
    assert!(polls >= 2, "expected repeated polls, got {polls}");

    dashboard.shutdown().await;
}

// ── Backend service ─────────────────────────────────────────────────

#[tokio::test]
async fn test_unhealthy_backend_is_logged() {
    let (server, dashboard, _conns) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "degraded",
            "version": "1.0.0"
        })))
        .mount(&server)
        .await;

    let health = dashboard.health().await.unwrap();
    assert!(!health.is_healthy());
    assert!(dashboard
        .log()
        .recent()
        .iter()
        .any(|e| e.level == LogLevel::Error && e.message.contains("degraded")));
}

#[tokio::test]
async fn test_available_images_and_info_pass_through() {
    let (server, dashboard, _conns) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/images/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": ["heart", "cross"],
            "count": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "platform": "Linux",
            "node": "robot-hub"
        })))
        .mount(&server)
        .await;

    let images = dashboard.available_images().await.unwrap();
    assert_eq!(images.images, vec!["heart", "cross"]);

    let info = dashboard.system_info().await.unwrap();
    assert_eq!(info.node.as_deref(), Some("robot-hub"));
    assert_eq!(info.architecture, None);
}
