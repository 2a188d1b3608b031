//! CLI configuration: thin wrapper around `robodash_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--backend, --insecure, --timeout).

use std::time::Duration;

use robodash_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use robodash_config::{
    Config, Profile, config_path, load_config, profile_to_dashboard_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolved settings for commands that talk to the backend.
#[derive(Debug)]
pub struct Resolved {
    pub dashboard: DashboardConfig,
    pub scan_timeout_secs: u64,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build the dashboard settings from the config file, the active profile
/// and CLI overrides. Without a profile, `--backend` alone is enough.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let name = active_profile_name(global, config);

    let profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            let backend = global.backend.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(backend)
        }
    };

    resolve_profile(&profile, global, config)
}

/// Translate a `Profile` + global flags into dashboard settings.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    global: &GlobalOpts,
    config: &Config,
) -> Result<Resolved, CliError> {
    let mut profile = profile.clone();

    // 1. Backend URL (flag > env > profile)
    if let Some(ref backend) = global.backend {
        profile.backend.clone_from(backend);
    }

    let mut dashboard = profile_to_dashboard_config(&profile, &config.defaults)?;

    // 2. TLS verification
    if global.insecure {
        dashboard.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 3. Timeout
    if let Some(secs) = global.timeout {
        dashboard.timeout = Duration::from_secs(secs);
    }

    Ok(Resolved {
        dashboard,
        scan_timeout_secs: profile.scan_timeout_secs(),
    })
}
