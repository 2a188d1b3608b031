// Backend response types
//
// Models for the dashboard backend's JSON API. Fields use `#[serde(default)]`
// liberally because the robot firmware only reports what its sensors produce
// and the backend forwards packets as-is.

use serde::{Deserialize, Serialize};

// ── Command acknowledgement ──────────────────────────────────────────

/// `{success, message?}` reply of every BLE command endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Device address, echoed by `/ble/connect`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

// ── BLE link ─────────────────────────────────────────────────────────

/// `GET /api/ble/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BleStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub device: String,
}

/// One advertisement seen during `GET /api/ble/scan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BleDevice {
    #[serde(default)]
    pub name: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
}

impl BleDevice {
    /// Advertised name, or `"Unknown"` for anonymous peripherals.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// `GET /api/ble/scan?timeout=N`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub devices: Vec<BleDevice>,
}

/// Body of `POST /api/ble/image`: a named preset or a raw 8x16 LED bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImagePayload {
    Named { name: String },
    Custom { data: [u8; 16] },
}

// ── Telemetry ────────────────────────────────────────────────────────

/// One telemetry packet as stored by the backend.
///
/// Every sensor field is optional: a missing field means "not reported"
/// and must leave the corresponding display untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Motor PWM duty, 0–255.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_pwm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_s: Option<u64>,
    /// Distance travelled this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_traveled_cm: Option<f64>,
    /// Ultrasonic range to the nearest obstacle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle_events: Option<u64>,
}

/// `data` of `/telemetry/latest` is a single object or a newest-first list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Envelope of `GET /api/telemetry/latest`.
#[derive(Debug, Deserialize)]
pub(crate) struct LatestTelemetryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<OneOrMany<TelemetrySample>>,
}

/// `GET /api/telemetry/total-stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TotalStats {
    #[serde(default)]
    pub total_distance_m: f64,
    #[serde(default)]
    pub total_uptime_hours: f64,
    #[serde(default)]
    pub total_obstacles: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_record: Option<String>,
}

/// Aggregates from `GET /api/telemetry/stats?hours=N`, used for charting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryStats {
    #[serde(default)]
    pub period_hours: u32,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub last_period_records: u64,
    #[serde(default)]
    pub avg_speed_pwm: f64,
    #[serde(default)]
    pub max_speed_pwm: f64,
    #[serde(default)]
    pub min_speed_pwm: f64,
    #[serde(default)]
    pub total_distance_cm: f64,
    #[serde(default)]
    pub avg_distance_cm: f64,
    #[serde(default)]
    pub obstacle_count: u64,
    #[serde(default)]
    pub avg_battery: f64,
    #[serde(default)]
    pub min_battery: f64,
    #[serde(default)]
    pub max_uptime: u64,
    #[serde(default)]
    pub mode_auto_count: u64,
    #[serde(default)]
    pub mode_manual_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default)]
    pub total_distance_km: f64,
}

// ── Events ───────────────────────────────────────────────────────────

/// Per-category event counts from `GET /api/events/summary?hours=N`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSummary {
    #[serde(default)]
    pub info: u64,
    #[serde(default)]
    pub warning: u64,
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub period_hours: u32,
    #[serde(default)]
    pub unacknowledged: u64,
}

/// A stored robot event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub acknowledged: bool,
}

/// `GET /api/events/summary?hours=N`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsSummaryResponse {
    #[serde(default)]
    pub summary: EventSummary,
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

// ── Backend service ──────────────────────────────────────────────────

/// `GET /api/health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Host details from `GET /api/info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub python_version: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
}

/// Preset LED images from `GET /api/images/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageList {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub count: usize,
}
