// ── Notification connection manager ──
//
// Owns at most one live `NotificationStream`. The stream task itself does
// the connect / read / fixed-delay reconnect cycle; this type decides when
// a stream exists at all. Events and state go through a `StreamSink` that
// outlives individual streams, so subscribers survive disconnect/connect.

use std::time::Duration;

use robodash_api::{
    NotificationStream, ReconnectConfig, StreamEvent, StreamSink, StreamState, StreamTls,
};
use tokio::sync::{Mutex, broadcast, watch};
use url::Url;

/// Where the notification stream lives, how to trust it, and how long to
/// wait before reopening it.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: Url,
    pub reconnect_delay: Duration,
    pub tls: StreamTls,
}

pub struct ConnectionManager {
    config: StreamConfig,
    sink: StreamSink,
    stream: Mutex<Option<NotificationStream>>,
}

impl ConnectionManager {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            sink: StreamSink::new(),
            stream: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open the stream unless it is already connecting or connected.
    ///
    /// A stream waiting out its reconnect delay attempts again right away.
    /// Returns `true` if this call started a connection attempt.
    pub async fn connect(&self) -> bool {
        let mut slot = self.stream.lock().await;
        if let Some(stream) = slot.as_ref().filter(|s| s.is_running()) {
            let state = self.state();
            if state == StreamState::Reconnecting {
                tracing::info!("reconnecting notification stream now");
                stream.retry_now();
                return true;
            }
            tracing::debug!(?state, "notification stream already active");
            return false;
        }

        tracing::info!(url = %self.config.url, "starting notification stream");
        *slot = Some(NotificationStream::spawn_with_tls(
            self.config.url.clone(),
            ReconnectConfig {
                delay: self.config.reconnect_delay,
            },
            self.config.tls.clone(),
            self.sink.clone(),
        ));
        true
    }

    /// Close the active stream and cancel any scheduled reconnect.
    ///
    /// Returns once the stream task has exited; the state then reads
    /// `Disconnected`. Returns `false` if there was nothing to close.
    pub async fn disconnect(&self) -> bool {
        let mut slot = self.stream.lock().await;
        let Some(stream) = slot.take() else {
            return false;
        };
        stream.shutdown().await;
        tracing::info!("notification stream stopped");
        true
    }

    pub fn state(&self) -> StreamState {
        self.sink.current_state()
    }

    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.sink.state()
    }

    /// Stream events from this and every later connection.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.sink.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager_for(url: &str) -> ConnectionManager {
        ConnectionManager::new(StreamConfig {
            url: Url::parse(url).unwrap(),
            reconnect_delay: Duration::from_secs(60),
            tls: StreamTls::default(),
        })
    }

    fn unreachable_manager() -> ConnectionManager {
        // Port 9 (discard) is closed on loopback; every attempt fails fast.
        manager_for("ws://127.0.0.1:9/ws/ble-notifications")
    }

    #[tokio::test]
    async fn second_connect_while_connecting_is_a_no_op() {
        // A listener that never completes the handshake holds the stream
        // in `Connecting`.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let manager = manager_for(&format!("ws://{addr}/ws/ble-notifications"));
        let mut state = manager.watch_state();

        assert!(manager.connect().await);
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == StreamState::Connecting),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(!manager.connect().await);
        assert!(manager.disconnect().await);
    }

    #[tokio::test]
    async fn disconnect_without_stream() {
        let manager = unreachable_manager();
        assert!(!manager.disconnect().await);
        assert_eq!(manager.state(), StreamState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_cancels_scheduled_reconnect() {
        let manager = unreachable_manager();
        let mut state = manager.watch_state();
        manager.connect().await;

        // The failed attempt parks the stream in its 60s reconnect wait.
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == StreamState::Reconnecting),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(manager.disconnect().await);
        assert_eq!(manager.state(), StreamState::Disconnected);

        // A fresh connect is allowed after an explicit disconnect.
        assert!(manager.connect().await);
        manager.disconnect().await;
    }

    #[tokio::test]
    async fn connect_during_reconnect_wait_attempts_immediately() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let manager = manager_for(&format!("ws://{addr}/ws/ble-notifications"));
        let mut state = manager.watch_state();
        assert!(manager.connect().await);
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == StreamState::Reconnecting),
        )
        .await
        .unwrap()
        .unwrap();

        // Backend is back; the 60s delay must not stand in the way.
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        assert!(manager.connect().await);

        let (tcp, _) = tokio::time::timeout(Duration::from_secs(2), listener.accept())
            .await
            .unwrap()
            .unwrap();
        let _server = tokio_tungstenite::accept_async(tcp).await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == StreamState::Connected),
        )
        .await
        .unwrap()
        .unwrap();

        // Once connected, another connect changes nothing.
        assert!(!manager.connect().await);
        manager.disconnect().await;
    }
}
