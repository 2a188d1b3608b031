#![allow(clippy::unwrap_used)]
// Integration tests for `BackendClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use robodash_api::{BackendClient, Error, ImagePayload, MAX_MESSAGE_CHARS, validate_message};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, BackendClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = BackendClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── BLE link ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Connecte au robot",
            "device": "48:87:2d:76:b3:1d"
        })))
        .mount(&server)
        .await;

    let ack = client.connect_robot().await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.device.as_deref(), Some("48:87:2d:76:b3:1d"));
}

#[tokio::test]
async fn test_connect_rejected_with_detail() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/connect"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "detail": { "success": false, "message": "Robot hors de portee" }
        })))
        .mount(&server)
        .await;

    let result = client.connect_robot().await;
    assert!(
        matches!(&result, Err(Error::Rejected { message }) if message == "Robot hors de portee"),
        "expected Rejected error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_disconnect_success_false_without_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/disconnect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let result = client.disconnect_robot().await;
    assert!(
        matches!(&result, Err(Error::Rejected { message }) if message == "disconnection failed"),
        "expected generic fallback, got: {result:?}"
    );
}

#[tokio::test]
async fn test_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ble/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connected": true,
            "device": "48:87:2d:76:b3:1d"
        })))
        .mount(&server)
        .await;

    let status = client.ble_status().await.unwrap();
    assert!(status.connected);
    assert_eq!(status.device, "48:87:2d:76:b3:1d");
}

#[tokio::test]
async fn test_scan_passes_timeout() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ble/scan"))
        .and(query_param("timeout", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "devices": [
                { "name": "BT05", "address": "48:87:2D:76:B3:1D" },
                { "name": null, "address": "11:22:33:44:55:66" }
            ]
        })))
        .mount(&server)
        .await;

    let scan = client.scan(5).await.unwrap();
    assert_eq!(scan.count, 2);
    assert_eq!(scan.devices[0].display_name(), "BT05");
    assert_eq!(scan.devices[1].display_name(), "Unknown");
}

#[tokio::test]
async fn test_send_message_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/message"))
        .and(body_json(json!({ "message": "Hello!" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Message \"Hello!\" envoye"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.send_message("Hello!").await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("Message \"Hello!\" envoye"));
}

#[tokio::test]
async fn test_long_message_never_reaches_backend() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.send_message("this is far too long").await;
    assert!(matches!(result, Err(Error::Validation { field: "message", .. })));
}

#[tokio::test]
async fn test_send_named_and_custom_image() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/image"))
        .and(body_json(json!({ "name": "heart" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/ble/image"))
        .and(body_json(json!({ "data": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_image(&ImagePayload::Named {
            name: "heart".into(),
        })
        .await
        .unwrap();

    let data = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
    client
        .send_image(&ImagePayload::Custom { data })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_image_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ble/image"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": { "success": false, "message": "Image \"unicorn\" inconnue ou erreur d'envoi" }
        })))
        .mount(&server)
        .await;

    let result = client
        .send_image(&ImagePayload::Named {
            name: "unicorn".into(),
        })
        .await;
    assert!(matches!(&result, Err(Error::Rejected { message }) if message.contains("unicorn")));
}

// ── Telemetry ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_latest_telemetry_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": 2,
            "data": [
                { "id": 2, "speed_pwm": 128, "mode": "auto", "distance_cm": 15.0 },
                { "id": 1, "speed_pwm": 0, "mode": "manual" }
            ]
        })))
        .mount(&server)
        .await;

    let samples = client.latest_telemetry(Some(2)).await.unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].speed_pwm, Some(128.0));
    assert_eq!(samples[0].mode.as_deref(), Some("auto"));
    assert_eq!(samples[1].distance_cm, None);
}

#[tokio::test]
async fn test_latest_telemetry_empty_database() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Aucune télémétrie disponible",
            "data": []
        })))
        .mount(&server)
        .await;

    let result = client.latest_sample().await;
    assert!(matches!(result, Err(Error::Rejected { .. })), "got {result:?}");
}

#[tokio::test]
async fn test_total_stats() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/total-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "total_distance_m": 152.4,
            "total_uptime_hours": 3.5,
            "total_obstacles": 17,
            "total_records": 980,
            "first_record": "2025-11-02T09:00:00",
            "last_record": "2025-11-03T18:30:00"
        })))
        .mount(&server)
        .await;

    let totals = client.total_stats().await.unwrap();
    assert!((totals.total_distance_m - 152.4).abs() < f64::EPSILON);
    assert_eq!(totals.total_obstacles, 17);
    assert_eq!(totals.total_records, Some(980));
}

#[tokio::test]
async fn test_telemetry_stats_window() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/telemetry/stats"))
        .and(query_param("hours", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "stats": {
                "period_hours": 6,
                "total_records": 120,
                "last_period_records": 40,
                "avg_speed_pwm": 97.5,
                "obstacle_count": 3,
                "mode_auto_count": 30,
                "mode_manual_count": 10,
                "current_mode": "auto"
            }
        })))
        .mount(&server)
        .await;

    let stats = client.telemetry_stats(6).await.unwrap();
    assert_eq!(stats.period_hours, 6);
    assert_eq!(stats.obstacle_count, 3);
    assert_eq!(stats.current_mode.as_deref(), Some("auto"));
}

#[tokio::test]
async fn test_events_summary() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/events/summary"))
        .and(query_param("hours", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "summary": {
                "info": 4, "warning": 2, "critical": 1,
                "total": 7, "period_hours": 24, "unacknowledged": 3
            },
            "events": [{
                "id": 7,
                "timestamp": "2025-11-03T18:29:00",
                "event_type": "OBSTACLE_DETECTED",
                "category": "critical",
                "description": "Obstacle a 12cm",
                "acknowledged": false
            }]
        })))
        .mount(&server)
        .await;

    let summary = client.events_summary(24).await.unwrap();
    assert_eq!(summary.summary.total, 7);
    assert_eq!(summary.summary.critical, 1);
    assert_eq!(summary.events.len(), 1);
    assert_eq!(
        summary.events[0].event_type.as_deref(),
        Some("OBSTACLE_DETECTED")
    );
}

// ── Service endpoints ───────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "message": "API IoT Robot operationnelle",
            "version": "1.0.0"
        })))
        .mount(&server)
        .await;

    let health = client.health().await.unwrap();
    assert!(health.is_healthy());
    assert_eq!(health.version.as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_system_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "platform": "Linux",
            "python_version": "3.11.4",
            "architecture": "aarch64",
            "node": "robot-hub"
        })))
        .mount(&server)
        .await;

    let info = client.system_info().await.unwrap();
    assert_eq!(info.platform.as_deref(), Some("Linux"));
    assert_eq!(info.architecture.as_deref(), Some("aarch64"));
    assert_eq!(info.node.as_deref(), Some("robot-hub"));
}

#[tokio::test]
async fn test_available_images() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/images/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": ["heart", "smile", "arrow_up"],
            "count": 3
        })))
        .mount(&server)
        .await;

    let list = client.available_images().await.unwrap();
    assert_eq!(list.count, 3);
    assert_eq!(list.images, vec!["heart", "smile", "arrow_up"]);
}

#[test]
fn test_message_validation_is_public() {
    assert!(validate_message("Hello").is_ok());
    assert!(validate_message("").is_err());
    let too_long = "x".repeat(MAX_MESSAGE_CHARS + 1);
    assert!(matches!(
        validate_message(&too_long),
        Err(Error::Validation { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Nothing listens on port 9 (discard) on loopback in test environments.
    let client = BackendClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
    );
    let result = client.ble_status().await;
    assert!(matches!(result, Err(Error::Transport(_))), "got {result:?}");
}
