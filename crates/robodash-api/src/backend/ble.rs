// Backend BLE link endpoints
//
// Connection management for the robot's Bluetooth link plus the two
// write operations the firmware understands: short text messages and
// LED-matrix images.

use serde_json::json;
use tracing::debug;

use crate::backend::client::BackendClient;
use crate::backend::models::{BleStatus, CommandResponse, ImagePayload, ScanResult};
use crate::error::Error;

/// Longest text the robot's LED matrix accepts in one message.
pub const MAX_MESSAGE_CHARS: usize = 15;

impl BackendClient {
    /// Ask the backend to open the BLE link to the robot.
    ///
    /// `POST /api/ble/connect`
    pub async fn connect_robot(&self) -> Result<CommandResponse, Error> {
        let url = self.api_url("ble/connect")?;
        debug!("connecting robot");
        let resp: CommandResponse = self.post(url, &json!({})).await?;
        require_success(resp, "connection failed")
    }

    /// Close the BLE link.
    ///
    /// `POST /api/ble/disconnect`
    pub async fn disconnect_robot(&self) -> Result<CommandResponse, Error> {
        let url = self.api_url("ble/disconnect")?;
        debug!("disconnecting robot");
        let resp: CommandResponse = self.post(url, &json!({})).await?;
        require_success(resp, "disconnection failed")
    }

    /// Current BLE link status.
    ///
    /// `GET /api/ble/status`
    pub async fn ble_status(&self) -> Result<BleStatus, Error> {
        let url = self.api_url("ble/status")?;
        self.get(url).await
    }

    /// Scan for nearby BLE peripherals for `timeout_secs` seconds.
    ///
    /// `GET /api/ble/scan?timeout=N`
    pub async fn scan(&self, timeout_secs: u64) -> Result<ScanResult, Error> {
        let mut url = self.api_url("ble/scan")?;
        url.query_pairs_mut()
            .append_pair("timeout", &timeout_secs.to_string());
        debug!(timeout_secs, "scanning for BLE devices");
        self.get(url).await
    }

    /// Send a short text message to the robot.
    ///
    /// `POST /api/ble/message` with `{"message": "..."}`. The text must be
    /// non-empty and at most [`MAX_MESSAGE_CHARS`] characters; longer text
    /// is rejected locally without contacting the backend.
    pub async fn send_message(&self, message: &str) -> Result<CommandResponse, Error> {
        validate_message(message)?;
        let url = self.api_url("ble/message")?;
        debug!(message, "sending message");
        let resp: CommandResponse = self.post(url, &json!({ "message": message })).await?;
        require_success(resp, "send failed")
    }

    /// Display an image on the robot's LED matrix.
    ///
    /// `POST /api/ble/image` with `{"name": "..."}` or `{"data": [16 bytes]}`.
    pub async fn send_image(&self, image: &ImagePayload) -> Result<CommandResponse, Error> {
        if let ImagePayload::Named { name } = image {
            if name.trim().is_empty() {
                return Err(Error::Validation {
                    field: "image",
                    reason: "image name is empty".into(),
                });
            }
        }
        let url = self.api_url("ble/image")?;
        debug!(?image, "sending image");
        let resp: CommandResponse = self.post(url, image).await?;
        require_success(resp, "send failed")
    }
}

/// Check the client-side message constraints.
pub fn validate_message(message: &str) -> Result<(), Error> {
    if message.is_empty() {
        return Err(Error::Validation {
            field: "message",
            reason: "message is empty".into(),
        });
    }
    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(Error::Validation {
            field: "message",
            reason: format!("{chars} characters (max {MAX_MESSAGE_CHARS})"),
        });
    }
    Ok(())
}

/// Turn a `success: false` acknowledgement into [`Error::Rejected`].
fn require_success(resp: CommandResponse, fallback: &str) -> Result<CommandResponse, Error> {
    if resp.success {
        Ok(resp)
    } else {
        Err(Error::Rejected {
            message: resp.message.unwrap_or_else(|| fallback.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_limits() {
        assert!(validate_message("Hello!").is_ok());
        assert!(validate_message("exactly15chars!").is_ok());
        assert!(matches!(
            validate_message(""),
            Err(Error::Validation { field: "message", .. })
        ));
        assert!(matches!(
            validate_message("sixteen chars!!!"),
            Err(Error::Validation { field: "message", .. })
        ));
    }

    #[test]
    fn message_limit_counts_characters_not_bytes() {
        assert!(validate_message("ééééééééééééééé").is_ok());
    }

    #[test]
    fn rejected_ack_uses_fallback() {
        let err = require_success(CommandResponse::default(), "send failed").err();
        assert!(matches!(err, Some(Error::Rejected { message }) if message == "send failed"));
    }
}
