//! BLE notification stream with auto-reconnect.
//!
//! Connects to the backend's `/ws/ble-notifications` endpoint and publishes
//! lifecycle and message events through a [`tokio::sync::broadcast`]
//! channel. Unexpected closure schedules a reconnect after a fixed delay;
//! [`retry_now`](NotificationStream::retry_now) cuts that wait short and
//! an explicit [`shutdown`](NotificationStream::shutdown) cancels it.
//!
//! # Example
//!
//! ```rust,ignore
//! use robodash_api::websocket::{NotificationStream, ReconnectConfig, StreamSink, notification_url};
//! use url::Url;
//!
//! let sink = StreamSink::new();
//! let mut rx = sink.subscribe();
//! let url = notification_url(&Url::parse("http://robot-hub.local:8000")?)?;
//! let stream = NotificationStream::spawn(url, ReconnectConfig::default(), sink.clone());
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{event:?}");
//! }
//!
//! stream.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::transport::StreamTls;

// ── Constants ────────────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Path of the notification endpoint, relative to the backend origin.
pub const NOTIFICATION_PATH: &str = "/ws/ble-notifications";

// ── NotificationMessage ──────────────────────────────────────────────

/// A decoded message from the notification stream.
///
/// The backend relays robot notifications as
/// `{"type": "ble_notification", "text": "..."}`; other message types are
/// accepted too and keep all their fields in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Message type, e.g. `"ble_notification"`.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Free-form payload text the robot embeds event markers into.
    #[serde(default)]
    pub text: Option<String>,

    /// All remaining fields the backend sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NotificationMessage {
    pub const BLE_NOTIFICATION: &'static str = "ble_notification";

    /// Build a `ble_notification` message carrying `text`.
    pub fn ble(text: impl Into<String>) -> Self {
        Self {
            kind: Self::BLE_NOTIFICATION.to_owned(),
            text: Some(text.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_ble_notification(&self) -> bool {
        self.kind == Self::BLE_NOTIFICATION
    }

    /// Payload text, or `""` when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Decode one text frame.
    pub fn parse(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

// ── Stream lifecycle ─────────────────────────────────────────────────

/// Observable state of the notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    /// No connection and none scheduled.
    Disconnected,
    /// Opening the WebSocket.
    Connecting,
    /// WebSocket open, reading messages.
    Connected,
    /// Connection lost; a reconnect is scheduled after the fixed delay.
    Reconnecting,
}

/// Events published by the stream task, in arrival order.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The WebSocket opened.
    Opened,
    /// A well-formed message arrived.
    Notification(Arc<NotificationMessage>),
    /// A frame could not be decoded and was dropped.
    Malformed { error: String, raw: String },
    /// Transport error; a `Closed` follows.
    Error(String),
    /// The connection is gone.
    Closed,
}

/// Fixed-delay reconnection policy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay between losing the stream and the next connect attempt. Default: 3s.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }
}

/// Derive the notification endpoint from the backend origin.
///
/// The scheme follows the origin's: `http → ws`, `https → wss`.
pub fn notification_url(origin: &Url) -> Result<Url, Error> {
    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported backend scheme '{other}'"
            )));
        }
    };
    let host = origin.host_str().unwrap_or("localhost");
    let url = match origin.port() {
        Some(p) => format!("{scheme}://{host}:{p}{NOTIFICATION_PATH}"),
        None => format!("{scheme}://{host}{NOTIFICATION_PATH}"),
    };
    Ok(Url::parse(&url)?)
}

// ── StreamSink ───────────────────────────────────────────────────────

/// Channels a stream task publishes into.
///
/// Outlives individual [`NotificationStream`]s so subscribers keep
/// receiving across disconnect / connect cycles.
#[derive(Clone)]
pub struct StreamSink {
    events: broadcast::Sender<StreamEvent>,
    state: Arc<watch::Sender<StreamState>>,
}

impl Default for StreamSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self {
            events,
            state: Arc::new(state),
        }
    }

    /// Get a new receiver for stream events.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    /// Watch the stream state.
    pub fn state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Current stream state.
    pub fn current_state(&self) -> StreamState {
        *self.state.borrow()
    }

    fn emit(&self, event: StreamEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: StreamState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}

// ── NotificationStream ───────────────────────────────────────────────

/// Handle to a running notification stream task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](Self::shutdown).
pub struct NotificationStream {
    cancel: CancellationToken,
    retry: Arc<Notify>,
    task: JoinHandle<()>,
}

impl NotificationStream {
    /// Spawn the connect / read / reconnect loop.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously and is reported through `sink`.
    pub fn spawn(url: Url, reconnect: ReconnectConfig, sink: StreamSink) -> Self {
        Self::spawn_with_tls(url, reconnect, StreamTls::default(), sink)
    }

    /// Like [`spawn`](Self::spawn), with explicit TLS settings for `wss://`.
    pub fn spawn_with_tls(
        url: Url,
        reconnect: ReconnectConfig,
        tls: StreamTls,
        sink: StreamSink,
    ) -> Self {
        let cancel = CancellationToken::new();
        let retry = Arc::new(Notify::new());
        let ctx = LoopContext {
            url,
            reconnect,
            tls,
            sink,
            cancel: cancel.clone(),
            retry: Arc::clone(&retry),
        };
        let task = tokio::spawn(stream_loop(ctx));
        Self {
            cancel,
            retry,
            task,
        }
    }

    /// `true` while the loop is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// End a pending reconnect wait and attempt immediately.
    ///
    /// Has no effect unless the loop is currently waiting to reconnect.
    pub fn retry_now(&self) {
        self.retry.notify_waiters();
    }

    /// Close the connection, cancel any pending reconnect, and wait for
    /// the task to exit. The sink reads `Disconnected` afterwards.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "notification stream task failed");
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

struct LoopContext {
    url: Url,
    reconnect: ReconnectConfig,
    tls: StreamTls,
    sink: StreamSink,
    cancel: CancellationToken,
    retry: Arc<Notify>,
}

/// Main loop: connect → read → on close, wait the fixed delay → reconnect.
async fn stream_loop(ctx: LoopContext) {
    let LoopContext {
        url,
        reconnect,
        tls,
        sink,
        cancel,
        retry,
    } = ctx;

    loop {
        sink.set_state(StreamState::Connecting);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, &tls, &sink, &cancel) => result,
        };

        match result {
            Ok(()) => tracing::info!("notification stream closed"),
            Err(e) => {
                tracing::warn!(error = %e, "notification stream error");
                sink.emit(StreamEvent::Error(e.to_string()));
            }
        }
        sink.emit(StreamEvent::Closed);

        if cancel.is_cancelled() {
            break;
        }

        // Registered before the state flips, so a `retry_now` from anyone
        // who saw `Reconnecting` is never lost.
        let woken = retry.notified();
        sink.set_state(StreamState::Reconnecting);
        tracing::info!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = woken => tracing::info!("reconnect requested, skipping remaining delay"),
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    sink.set_state(StreamState::Disconnected);
    tracing::debug!("notification stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and read messages until it drops.
///
/// Returns `Ok(())` on a clean close or cancellation.
async fn connect_and_read(
    url: &Url,
    tls: &StreamTls,
    sink: &StreamSink,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(
        url = %url,
        custom_tls = !tls.is_default(),
        "connecting to notification stream"
    );

    let connector = tls.connector();
    let (ws_stream, _response) =
        tokio_tungstenite::connect_async_tls_with_config(url.as_str(), None, false, connector)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    sink.set_state(StreamState::Connected);
    sink.emit(StreamEvent::Opened);
    tracing::info!("notification stream connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_publish(text.as_str(), sink);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite queues the pong itself
                        tracing::trace!("notification stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "close frame received"
                            );
                        } else {
                            tracing::info!("close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("notification stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame
                    }
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Decode a text frame and publish it. Undecodable frames are dropped
/// with a `Malformed` event; the connection stays open.
fn parse_and_publish(text: &str, sink: &StreamSink) {
    match NotificationMessage::parse(text) {
        Ok(message) => sink.emit(StreamEvent::Notification(Arc::new(message))),
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse notification");
            sink.emit(StreamEvent::Malformed {
                error: e.to_string(),
                raw: text.to_owned(),
            });
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_delay_is_three_seconds() {
        assert_eq!(ReconnectConfig::default().delay, Duration::from_secs(3));
    }

    #[test]
    fn notification_url_follows_origin_scheme() {
        let plain = notification_url(&Url::parse("http://robot-hub.local:8000/").expect("url"))
            .expect("ws url");
        assert_eq!(plain.as_str(), "ws://robot-hub.local:8000/ws/ble-notifications");

        let secure = notification_url(&Url::parse("https://robot.example.com").expect("url"))
            .expect("wss url");
        assert_eq!(secure.as_str(), "wss://robot.example.com/ws/ble-notifications");
    }

    #[test]
    fn notification_url_rejects_other_schemes() {
        let origin = Url::parse("ftp://robot.example.com").expect("url");
        assert!(notification_url(&origin).is_err());
    }

    #[test]
    fn deserialize_ble_notification() {
        let msg = NotificationMessage::parse(
            r#"{"type":"ble_notification","text":"EVENT:AUTO_MODE","rssi":-60}"#,
        )
        .expect("parse");
        assert!(msg.is_ble_notification());
        assert_eq!(msg.text(), "EVENT:AUTO_MODE");
        assert_eq!(msg.extra["rssi"], -60);
    }

    #[test]
    fn other_message_types_keep_their_fields() {
        let msg = NotificationMessage::parse(r#"{"type":"status","connected":true}"#)
            .expect("parse");
        assert!(!msg.is_ble_notification());
        assert_eq!(msg.text, None);
        assert_eq!(msg.extra["connected"], true);
    }

    #[test]
    fn parse_and_publish_notification() {
        let sink = StreamSink::new();
        let mut rx = sink.subscribe();

        parse_and_publish(r#"{"type":"ble_notification","text":"event:headlights_on"}"#, &sink);

        match rx.try_recv() {
            Ok(StreamEvent::Notification(msg)) => assert_eq!(msg.text(), "event:headlights_on"),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn parse_and_publish_malformed_json() {
        let sink = StreamSink::new();
        let mut rx = sink.subscribe();

        parse_and_publish("not json at all", &sink);

        match rx.try_recv() {
            Ok(StreamEvent::Malformed { raw, .. }) => assert_eq!(raw, "not json at all"),
            other => panic!("expected malformed event, got {other:?}"),
        }
    }

    #[test]
    fn sink_starts_disconnected() {
        assert_eq!(StreamSink::new().current_state(), StreamState::Disconnected);
    }
}
