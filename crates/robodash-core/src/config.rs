// ── Runtime dashboard configuration ──
//
// Describes *where* the backend lives and how the pipeline is tuned.
// Never touches disk: the CLI builds a `DashboardConfig` from its profile
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use robodash_api::{TlsMode, TransportConfig, notification_url};
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab backends).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard session against a single backend.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend origin (e.g., `http://robot-hub.local:8000`).
    pub backend: Url,
    /// Explicit notification endpoint. Derived from `backend` when unset.
    pub stream_url: Option<Url>,
    pub tls: TlsVerification,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Fixed delay before reopening a lost notification stream.
    pub reconnect_delay: Duration,
    /// How long one obstacle alarm keeps the critical flag set.
    pub obstacle_window: Duration,
    /// Range below which the obstacle indicator is held critical.
    pub proximity_threshold_cm: f64,
    /// Latest-sample poll interval.
    pub telemetry_interval: Duration,
    /// Lifetime totals poll interval.
    pub totals_interval: Duration,
}

impl DashboardConfig {
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);
    pub const DEFAULT_OBSTACLE_WINDOW: Duration = Duration::from_millis(3000);
    pub const DEFAULT_PROXIMITY_THRESHOLD_CM: f64 = 20.0;
    pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_TOTALS_INTERVAL: Duration = Duration::from_secs(30);

    /// Defaults for everything but the backend origin.
    pub fn new(backend: Url) -> Self {
        Self {
            backend,
            stream_url: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
            obstacle_window: Self::DEFAULT_OBSTACLE_WINDOW,
            proximity_threshold_cm: Self::DEFAULT_PROXIMITY_THRESHOLD_CM,
            telemetry_interval: Self::DEFAULT_TELEMETRY_INTERVAL,
            totals_interval: Self::DEFAULT_TOTALS_INTERVAL,
        }
    }

    /// Notification endpoint: the override, or `ws(s)://<backend>/ws/ble-notifications`.
    pub fn stream_url(&self) -> Result<Url, CoreError> {
        match &self.stream_url {
            Some(url) => Ok(url.clone()),
            None => notification_url(&self.backend).map_err(|e| CoreError::Config {
                message: e.to_string(),
            }),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
