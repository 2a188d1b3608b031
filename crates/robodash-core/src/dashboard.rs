// ── Dashboard facade ──
//
// Wires the backend client, the notification connection, the indicator
// board, the metric tiles and the log book into one cloneable handle.
// `start()` spawns the event pump and the pollers; `shutdown()` stops them
// and closes the stream.

use std::sync::Arc;

use robodash_api::{
    BackendClient, BleStatus, CommandResponse, EventsSummaryResponse, HealthStatus, ImageList,
    ImagePayload, NotificationMessage, ScanResult, StreamEvent, StreamState, SystemInfo,
    TelemetrySample, TelemetryStats, TotalStats, validate_message,
};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::board::IndicatorBoard;
use crate::config::DashboardConfig;
use crate::connection::{ConnectionManager, StreamConfig};
use crate::error::CoreError;
use crate::event::{EventTag, EventTags, classify};
use crate::indicator::IndicatorState;
use crate::logbook::{LogBook, LogLevel};
use crate::metrics::DashboardMetrics;
use crate::poller::{telemetry_poll_task, totals_poll_task};

/// Handle to one dashboard session. Cheaply cloneable.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: BackendClient,
    connection: ConnectionManager,
    board: IndicatorBoard,
    metrics: watch::Sender<DashboardMetrics>,
    log: LogBook,
    cancel: CancellationToken,
    /// Child token for the running background tasks; replaced on restart.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build a dashboard for `config`. Nothing is contacted until a
    /// command or [`start`](Self::start) runs.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let client = BackendClient::new(config.backend.clone(), &config.transport())?;
        Self::with_client(config, client)
    }

    /// Build a dashboard around an existing backend client.
    pub fn with_client(config: DashboardConfig, client: BackendClient) -> Result<Self, CoreError> {
        let connection = ConnectionManager::new(StreamConfig {
            url: config.stream_url()?,
            reconnect_delay: config.reconnect_delay,
            tls: config.transport().stream_tls()?,
        });
        let board = IndicatorBoard::new(config.obstacle_window, config.proximity_threshold_cm);
        let (metrics, _) = watch::channel(DashboardMetrics::default());
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                connection,
                board,
                metrics,
                log: LogBook::new(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &BackendClient {
        &self.inner.client
    }

    pub fn log(&self) -> &LogBook {
        &self.inner.log
    }

    pub fn indicators(&self) -> IndicatorState {
        self.inner.board.current()
    }

    pub fn watch_indicators(&self) -> watch::Receiver<IndicatorState> {
        self.inner.board.subscribe()
    }

    pub fn metrics(&self) -> DashboardMetrics {
        self.inner.metrics.borrow().clone()
    }

    pub fn watch_metrics(&self) -> watch::Receiver<DashboardMetrics> {
        self.inner.metrics.subscribe()
    }

    pub fn connection_state(&self) -> StreamState {
        self.inner.connection.state()
    }

    pub fn watch_connection(&self) -> watch::Receiver<StreamState> {
        self.inner.connection.watch_state()
    }

    /// Raw stream events, before classification.
    pub fn stream_events(&self) -> broadcast::Receiver<StreamEvent> {
        self.inner.connection.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the event pump and both pollers.
    ///
    /// The pump subscribes before returning, so no stream event opened
    /// after this call is missed. Calling `start` twice restarts the tasks.
    pub async fn start(&self) {
        self.stop_tasks().await;

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let mut handles = self.inner.task_handles.lock().await;

        let events = self.inner.connection.subscribe();
        handles.push(tokio::spawn(event_pump(self.clone(), events, child.clone())));

        if !self.inner.config.telemetry_interval.is_zero() {
            handles.push(tokio::spawn(telemetry_poll_task(
                self.clone(),
                self.inner.config.telemetry_interval,
                child.clone(),
            )));
        }
        if !self.inner.config.totals_interval.is_zero() {
            handles.push(tokio::spawn(totals_poll_task(
                self.clone(),
                self.inner.config.totals_interval,
                child,
            )));
        }

        info!(backend = %self.inner.config.backend, "dashboard started");
        self.inner.log.info("Dashboard ready");
    }

    /// Stop background tasks, close the stream and drop obstacle timers.
    pub async fn shutdown(&self) {
        self.inner.connection.disconnect().await;
        self.stop_tasks().await;
        self.inner.board.shutdown();
        self.inner.cancel.cancel();
        debug!("dashboard shut down");
    }

    async fn stop_tasks(&self) {
        self.inner.cancel_child.lock().await.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
    }

    /// Open the notification stream without touching the robot link.
    pub async fn open_stream(&self) -> bool {
        self.inner.connection.connect().await
    }

    /// Close the notification stream; no reconnect follows.
    pub async fn close_stream(&self) -> bool {
        self.inner.connection.disconnect().await
    }

    // ── Robot link ───────────────────────────────────────────────────

    /// Ask the backend to connect to the robot, then open the stream.
    pub async fn connect_robot(&self) -> Result<CommandResponse, CoreError> {
        self.inner.log.info("Connecting...");
        let ack = self
            .inner
            .client
            .connect_robot()
            .await
            .map_err(|e| self.report(e.into()))?;

        self.inner.log.success("Connected to robot!");
        self.inner.connection.connect().await;
        Ok(ack)
    }

    /// Ask the backend to drop the robot link, then close the stream.
    pub async fn disconnect_robot(&self) -> Result<CommandResponse, CoreError> {
        self.inner.log.info("Disconnecting...");
        let ack = self
            .inner
            .client
            .disconnect_robot()
            .await
            .map_err(|e| self.report(e.into()))?;

        self.inner.log.success("Disconnected from robot!");
        self.inner.connection.disconnect().await;
        Ok(ack)
    }

    pub async fn status(&self) -> Result<BleStatus, CoreError> {
        let status = self
            .inner
            .client
            .ble_status()
            .await
            .map_err(|e| self.report(e.into()))?;

        let link = if status.connected { "Connected" } else { "Disconnected" };
        self.inner
            .log
            .info(format!("Status: {link} - Device: {}", status.device));
        Ok(status)
    }

    pub async fn scan(&self, timeout_secs: u64) -> Result<ScanResult, CoreError> {
        self.inner.log.info("Scanning...");
        let result = self
            .inner
            .client
            .scan(timeout_secs)
            .await
            .map_err(|e| self.report(e.into()))?;

        self.inner
            .log
            .success(format!("{} devices found", result.count));
        for (i, device) in result.devices.iter().enumerate() {
            self.inner.log.info(format!(
                "  {}. {} ({})",
                i + 1,
                device.display_name(),
                device.address
            ));
        }
        Ok(result)
    }

    /// Send a short text to the robot's display. Checked locally first.
    pub async fn send_message(&self, message: &str) -> Result<CommandResponse, CoreError> {
        validate_message(message).map_err(|e| self.report(e.into()))?;

        self.inner.log.info(format!("Sending message: \"{message}\""));
        let ack = self
            .inner
            .client
            .send_message(message)
            .await
            .map_err(|e| self.report(e.into()))?;

        self.inner
            .log
            .success(ack.message.clone().unwrap_or_else(|| "Message sent".into()));
        Ok(ack)
    }

    pub async fn send_image(&self, image: &ImagePayload) -> Result<CommandResponse, CoreError> {
        match image {
            ImagePayload::Named { name } => {
                self.inner.log.info(format!("Sending image: \"{name}\""));
            }
            ImagePayload::Custom { .. } => self.inner.log.info("Sending custom image"),
        }

        let ack = self
            .inner
            .client
            .send_image(image)
            .await
            .map_err(|e| self.report(e.into()))?;

        self.inner
            .log
            .success(ack.message.clone().unwrap_or_else(|| "Image sent".into()));
        Ok(ack)
    }

    // ── Telemetry ────────────────────────────────────────────────────

    /// Fetch the newest sample and project it onto tiles and indicators.
    pub async fn refresh_telemetry(&self) -> Result<Option<TelemetrySample>, CoreError> {
        let sample = match self.inner.client.latest_sample().await {
            Ok(sample) => sample,
            // An empty history is not a failure for the tiles.
            Err(robodash_api::Error::Rejected { message }) => {
                debug!(%message, "no telemetry yet");
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(sample) = &sample {
            self.inner.metrics.send_modify(|m| m.apply_sample(sample));
            self.inner.board.apply_telemetry(sample);
        }
        Ok(sample)
    }

    /// Fetch lifetime totals and project them onto the totals tiles.
    pub async fn refresh_totals(&self) -> Result<TotalStats, CoreError> {
        let totals = self.inner.client.total_stats().await?;
        self.inner.metrics.send_modify(|m| m.apply_totals(&totals));
        self.inner.log.success(format!(
            "Totals updated: {}m, {}h, {} obstacles",
            totals.total_distance_m, totals.total_uptime_hours, totals.total_obstacles
        ));
        Ok(totals)
    }

    pub async fn latest_telemetry(&self, limit: Option<u32>) -> Result<Vec<TelemetrySample>, CoreError> {
        Ok(self.inner.client.latest_telemetry(limit).await?)
    }

    pub async fn telemetry_stats(&self, hours: u32) -> Result<TelemetryStats, CoreError> {
        Ok(self.inner.client.telemetry_stats(hours).await?)
    }

    pub async fn events_summary(&self, hours: u32) -> Result<EventsSummaryResponse, CoreError> {
        Ok(self.inner.client.events_summary(hours).await?)
    }

    // ── Backend service ──────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthStatus, CoreError> {
        let health = self
            .inner
            .client
            .health()
            .await
            .map_err(|e| self.report(e.into()))?;
        if !health.is_healthy() {
            warn!(status = %health.status, "backend reports unhealthy");
            self.inner
                .log
                .error(format!("Backend reports status '{}'", health.status));
        }
        Ok(health)
    }

    pub async fn system_info(&self) -> Result<SystemInfo, CoreError> {
        Ok(self.inner.client.system_info().await?)
    }

    /// Preset image names the backend can display.
    pub async fn available_images(&self) -> Result<ImageList, CoreError> {
        Ok(self.inner.client.available_images().await?)
    }

    // ── Event handling ───────────────────────────────────────────────

    /// Apply one stream event: lifecycle lines go to the log book,
    /// notifications are classified and projected.
    pub fn handle_stream_event(&self, event: &StreamEvent) {
        let log = &self.inner.log;
        match event {
            StreamEvent::Opened => log.success("Listening for BLE notifications..."),
            StreamEvent::Notification(message) => {
                self.handle_notification(message);
            }
            StreamEvent::Malformed { error, .. } => {
                log.error(format!("Stream parse error: {error}"));
            }
            StreamEvent::Error(reason) => log.error(format!("Stream error: {reason}")),
            StreamEvent::Closed => log.error("Stream disconnected"),
        }
    }

    /// Log and classify one decoded message, returning the tags applied.
    ///
    /// Only `ble_notification` messages drive indicators; any other type is
    /// logged verbatim and ignored.
    pub fn handle_notification(&self, message: &NotificationMessage) -> EventTags {
        let log = &self.inner.log;

        if !message.is_ble_notification() {
            let raw = serde_json::to_string(message).unwrap_or_else(|_| message.kind.clone());
            log.info(format!("Received: {raw}"));
            return EventTags::EMPTY;
        }

        log.notification(format!("BLE NOTI: {}", message.text()));

        let tags = classify(message);
        for tag in tags.iter() {
            let (level, line) = tag_log_line(tag);
            log.record(level, line);
        }
        if !tags.is_empty() {
            let state = self.inner.board.apply_tags(tags);
            debug!(?tags, ?state, "indicators updated");
        }
        tags
    }

    /// Log a failed operation and hand the error back.
    fn report(&self, err: CoreError) -> CoreError {
        let line = match &err {
            CoreError::Rejected { message } | CoreError::ValidationFailed { message } => {
                format!("Error: {message}")
            }
            other => format!("Error: {other}"),
        };
        self.inner.log.error(line);
        err
    }
}

fn tag_log_line(tag: EventTag) -> (LogLevel, &'static str) {
    match tag {
        EventTag::AutoMode => (LogLevel::Success, "Auto mode enabled"),
        EventTag::ManualMode => (LogLevel::Success, "Manual mode enabled"),
        EventTag::HeadlightsOn => (LogLevel::Success, "Headlights on"),
        EventTag::HeadlightsOff => (LogLevel::Info, "Headlights off"),
        EventTag::ObstacleDetected => (LogLevel::Error, "OBSTACLE DETECTED!"),
    }
}

/// Single consumer of stream events; preserves arrival order.
async fn event_pump(
    dashboard: Dashboard,
    mut events: broadcast::Receiver<StreamEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = events.recv() => {
                match result {
                    Ok(event) => dashboard.handle_stream_event(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event pump: receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("event pump exiting");
}
