// robodash-api: Async Rust client for the robot dashboard backend (REST + notification stream)

pub mod backend;
pub mod error;
pub mod transport;
pub mod websocket;

pub use backend::{BackendClient, MAX_MESSAGE_CHARS, validate_message};
pub use backend::models::{
    BleDevice, BleStatus, CommandResponse, EventRecord, EventSummary, EventsSummaryResponse,
    HealthStatus, ImageList, ImagePayload, ScanResult, SystemInfo, TelemetrySample,
    TelemetryStats, TotalStats,
};
pub use error::Error;
pub use transport::{StreamTls, TlsMode, TransportConfig};
pub use websocket::{
    NOTIFICATION_PATH, NotificationMessage, NotificationStream, ReconnectConfig, StreamEvent,
    StreamSink, StreamState, notification_url,
};
