// ── Core error types ──
//
// User-facing errors from robodash-core. Consumers never see reqwest or
// serde errors directly; the `From<robodash_api::Error>` impl translates
// backend-boundary failures into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    BackendUnreachable { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    #[error("Notification stream failed: {reason}")]
    Stream { reason: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Rejected by backend: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if the backend answered with an application-level failure.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<robodash_api::Error> for CoreError {
    fn from(err: robodash_api::Error) -> Self {
        match err {
            robodash_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() || e.is_request() {
                    CoreError::BackendUnreachable {
                        url: e
                            .url()
                            .map(|u| u.origin().ascii_serialization())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            robodash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            robodash_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            robodash_api::Error::Rejected { message } => CoreError::Rejected { message },
            robodash_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            robodash_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            robodash_api::Error::Validation { field, reason } => CoreError::ValidationFailed {
                message: format!("{field}: {reason}"),
            },
            robodash_api::Error::WebSocketConnect(reason) => CoreError::Stream { reason },
        }
    }
}
