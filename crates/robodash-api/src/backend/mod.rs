// Backend client modules
//
// Hand-written client for the dashboard backend's REST endpoints under
// `/api/`: BLE link control (`ble/*`), telemetry (`telemetry/*`), event
// history (`events/*`) and the service endpoints (`health`, `info`,
// `images/list`).

pub mod ble;
pub mod client;
pub mod models;
pub mod system;
pub mod telemetry;

pub use ble::{MAX_MESSAGE_CHARS, validate_message};
pub use client::BackendClient;
