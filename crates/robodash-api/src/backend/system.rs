// Backend service endpoints
//
// Liveness, host details and the preset image catalogue. None of these
// touch the robot; they answer even while the BLE link is down.

use tracing::debug;

use crate::backend::client::BackendClient;
use crate::backend::models::{HealthStatus, ImageList, SystemInfo};
use crate::error::Error;

impl BackendClient {
    /// `GET /api/health`
    pub async fn health(&self) -> Result<HealthStatus, Error> {
        let url = self.api_url("health")?;
        debug!("checking backend health");
        self.get(url).await
    }

    /// `GET /api/info`
    pub async fn system_info(&self) -> Result<SystemInfo, Error> {
        let url = self.api_url("info")?;
        debug!("fetching backend system info");
        self.get(url).await
    }

    /// Names accepted by [`show_image`](Self::send_image) as presets.
    ///
    /// `GET /api/images/list`
    pub async fn available_images(&self) -> Result<ImageList, Error> {
        let url = self.api_url("images/list")?;
        debug!("listing preset images");
        self.get(url).await
    }
}
