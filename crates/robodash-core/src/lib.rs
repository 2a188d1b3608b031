//! Event pipeline and reactive dashboard state between `robodash-api` and
//! the CLI.
//!
//! - **[`Dashboard`]**: facade over one backend. Robot commands go through
//!   it; [`start()`](Dashboard::start) spawns the stream event pump and the
//!   telemetry pollers.
//!
//! - **[`ConnectionManager`]**: owns at most one notification stream, with
//!   a fixed-delay reconnect that an explicit disconnect cancels.
//!
//! - **[`classify`]** / **[`project`]**: pure functions from notification
//!   text to [`EventTags`] and from tags to [`IndicatorState`].
//!
//! - **[`IndicatorBoard`]**: the live indicator state in a `watch` channel,
//!   plus the obstacle alarm expiry timers.
//!
//! - **[`DashboardMetrics`]** and **[`LogBook`]**: the metric tiles and the
//!   operator activity log.

pub mod board;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod indicator;
pub mod logbook;
pub mod metrics;
mod poller;

// ── Primary re-exports ──────────────────────────────────────────────
pub use board::IndicatorBoard;
pub use config::{DashboardConfig, TlsVerification};
pub use connection::{ConnectionManager, StreamConfig};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use event::{EventTag, EventTags, classify, classify_text};
pub use indicator::{IndicatorState, ObstacleIndicator, project, project_telemetry};
pub use logbook::{LogBook, LogEntry, LogLevel};
pub use metrics::{DashboardMetrics, format_meters, speed_percent};

/// Stream lifecycle state, as tracked by [`ConnectionManager`].
pub use robodash_api::StreamState as ConnectionState;

// Wire types consumers need alongside the dashboard.
pub use robodash_api::{
    BleDevice, BleStatus, CommandResponse, EventRecord, EventSummary, EventsSummaryResponse,
    HealthStatus, ImageList, ImagePayload, NotificationMessage, ScanResult, StreamEvent,
    SystemInfo, TelemetrySample, TelemetryStats, TotalStats,
};
