// Backend HTTP client
//
// Wraps `reqwest::Client` with dashboard-backend URL construction and
// response unwrapping. Endpoint groups (BLE link, telemetry) are
// implemented as inherent methods in sibling files to keep this module
// focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt carried into error messages.
const BODY_PREVIEW: usize = 200;

/// FastAPI wraps raised `HTTPException`s as `{"detail": ...}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Raw HTTP client for the robot dashboard backend.
///
/// Every endpoint lives under `{base}/api/…`. Methods return typed
/// payloads; application-level failures (`success: false`) surface as
/// [`Error::Rejected`] carrying the backend's message.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client from a `TransportConfig`.
    ///
    /// The `base_url` is the backend origin (e.g. `http://robot-hub.local:8000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a backend client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend origin.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Send a POST request with a JSON body and decode the JSON reply.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Map non-2xx statuses to errors and decode successful bodies.
    ///
    /// Error bodies are searched for a backend-provided message in
    /// `detail.message`, `detail.error`, `message` or `error`, in that order.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Build the error for a non-success response.
///
/// A body that explicitly says `success: false` is an application-level
/// rejection; anything else is a plain HTTP failure.
fn error_from_body(status: u16, body: &str) -> Error {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return Error::Http {
            status,
            message: preview(body).to_owned(),
        };
    };

    let (detail_success, detail_message) = match &parsed.detail {
        Some(serde_json::Value::Object(map)) => (
            map.get("success").and_then(serde_json::Value::as_bool),
            map.get("message")
                .or_else(|| map.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(String::from),
        ),
        Some(serde_json::Value::String(s)) => (None, Some(s.clone())),
        // Request validation failures: `{"detail": [{"msg": "...", ...}]}`
        Some(serde_json::Value::Array(items)) => (
            None,
            items
                .iter()
                .find_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .map(String::from),
        ),
        _ => (None, None),
    };

    let message = detail_message
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| format!("HTTP {status}"));

    if detail_success == Some(false) || parsed.success == Some(false) {
        Error::Rejected { message }
    } else {
        Error::Http { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_without_double_slash() {
        let client = BackendClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://robot-hub.local:8000/").expect("url"),
        );
        let url = client.api_url("/ble/status").expect("api url");
        assert_eq!(url.as_str(), "http://robot-hub.local:8000/api/ble/status");
    }

    #[test]
    fn detail_object_becomes_rejection() {
        let body = r#"{"detail":{"success":false,"message":"Echec de la connexion au robot"}}"#;
        let err = error_from_body(503, body);
        assert!(
            matches!(&err, Error::Rejected { message } if message == "Echec de la connexion au robot"),
            "got {err:?}"
        );
    }

    #[test]
    fn detail_error_field_is_used() {
        let body = r#"{"detail":{"success":false,"error":"adapter busy"}}"#;
        let err = error_from_body(500, body);
        assert!(matches!(&err, Error::Rejected { message } if message == "adapter busy"));
    }

    #[test]
    fn validation_detail_list_is_http_error() {
        let body = r#"{"detail":[{"loc":["body","message"],"msg":"String should have at most 15 characters"}]}"#;
        let err = error_from_body(422, body);
        assert!(
            matches!(&err, Error::Http { status: 422, message } if message.contains("15 characters")),
            "got {err:?}"
        );
    }

    #[test]
    fn non_json_body_is_previewed() {
        let err = error_from_body(502, "Bad Gateway");
        assert!(matches!(&err, Error::Http { status: 502, message } if message == "Bad Gateway"));
    }
}
