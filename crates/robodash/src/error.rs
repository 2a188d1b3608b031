//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use robodash_config::ConfigError;
use robodash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const REJECTED: i32 = 9;
    pub const CONFIG: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(robodash::connection_failed),
        help(
            "Check that the dashboard backend is running and reachable.\n\
             URL: {url}\n\
             Try: robodash status --backend http://<host>:8000"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Notification stream failed: {reason}")]
    #[diagnostic(
        code(robodash::stream_failed),
        help("Check the stream_url in your profile, or let it derive from the backend URL.")
    )]
    StreamFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(robodash::timeout),
        help("Increase the timeout with --timeout or check the backend's responsiveness.")
    )]
    Timeout,

    // ── Backend replies ──────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(robodash::rejected),
        help("The backend refused the command. Is the robot powered on and in range?")
    )]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(robodash::api_error))]
    ApiError { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(robodash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(robodash::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: robodash config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(robodash::no_config),
        help(
            "Create a profile with: robodash config init --backend <url>\n\
             Or pass --backend / set ROBODASH_BACKEND.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(robodash::config))]
    Config(Box<figment::Error>),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(robodash::config))]
    ConfigFile(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(robodash::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::StreamFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_)
            | Self::ConfigFile(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BackendUnreachable { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::Timeout => CliError::Timeout,
            CoreError::Stream { reason } => CliError::StreamFailed { reason },
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::ValidationFailed { message } => match message.split_once(": ") {
                Some((field, reason)) => CliError::Validation {
                    field: field.into(),
                    reason: reason.into(),
                },
                None => CliError::Validation {
                    field: "input".into(),
                    reason: message,
                },
            },
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            CoreError::Config { message } => CliError::ConfigFile(ConfigError::Validation {
                field: "configuration".into(),
                reason: message,
            }),
            CoreError::Internal(message) => CliError::ApiError {
                message,
                status: None,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Figment(inner) => CliError::Config(inner),
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::ConfigFile(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::BackendUnreachable {
                    url: "http://localhost:8000".into(),
                    reason: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (CoreError::Timeout, exit_code::TIMEOUT),
            (
                CoreError::Rejected {
                    message: "Robot introuvable".into(),
                },
                exit_code::REJECTED,
            ),
            (
                CoreError::ValidationFailed {
                    message: "message: at most 15 characters".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::Api {
                    message: "boom".into(),
                    status: Some(500),
                },
                exit_code::GENERAL,
            ),
        ];

        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn validation_message_splits_field() {
        let err = CliError::from(CoreError::ValidationFailed {
            message: "message: must not be empty".into(),
        });
        assert!(
            matches!(err, CliError::Validation { ref field, ref reason }
                if field == "message" && reason == "must not be empty")
        );
    }

    #[test]
    fn config_errors_exit_with_config_code() {
        let err = CliError::from(ConfigError::UnknownProfile { name: "lab".into() });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
    }
}
