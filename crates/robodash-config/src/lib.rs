//! Shared configuration for robodash.
//!
//! TOML profiles merged with defaults and `ROBODASH_` environment
//! variables, and translation to `robodash_core::DashboardConfig`. The CLI
//! layers its own flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use robodash_core::{DashboardConfig, TlsVerification};

/// Prefix of environment overrides. Nested keys use `__`:
/// `ROBODASH_DEFAULTS__TIMEOUT=10`.
pub const ENV_PREFIX: &str = "ROBODASH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile to use: `requested`, else `default_profile`, else `"default"`.
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile. Unset tuning fields fall back to the
/// dashboard defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend origin (e.g., "http://robot-hub.local:8000").
    pub backend: String,

    /// Explicit notification stream URL; derived from `backend` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle_window_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity_threshold_cm: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_interval_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals_interval_secs: Option<u64>,

    /// Default `scan` duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_timeout_secs: Option<u64>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Profile {
    pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 5;

    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    pub fn scan_timeout_secs(&self) -> u64 {
        self.scan_timeout_secs
            .unwrap_or(Self::DEFAULT_SCAN_TIMEOUT_SECS)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "robodash", "robodash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("robodash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is fine.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `DashboardConfig` from a profile, without CLI flag overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let backend = parse_url("backend", &profile.backend)?;
    let mut cfg = DashboardConfig::new(backend);

    if let Some(ref raw) = profile.stream_url {
        cfg.stream_url = Some(parse_url("stream_url", raw)?);
    }

    cfg.tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    cfg.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    if let Some(ms) = profile.reconnect_delay_ms {
        if ms == 0 {
            return Err(ConfigError::Validation {
                field: "reconnect_delay_ms".into(),
                reason: "must be at least 1 ms".into(),
            });
        }
        cfg.reconnect_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = profile.obstacle_window_ms {
        cfg.obstacle_window = Duration::from_millis(ms);
    }
    if let Some(cm) = profile.proximity_threshold_cm {
        if !cm.is_finite() || cm < 0.0 {
            return Err(ConfigError::Validation {
                field: "proximity_threshold_cm".into(),
                reason: format!("expected a non-negative distance, got {cm}"),
            });
        }
        cfg.proximity_threshold_cm = cm;
    }
    if let Some(secs) = profile.telemetry_interval_secs {
        cfg.telemetry_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.totals_interval_secs {
        cfg.totals_interval = Duration::from_secs(secs);
    }

    Ok(cfg)
}
