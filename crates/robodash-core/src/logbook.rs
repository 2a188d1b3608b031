// ── Log book ──
//
// The operator-facing activity log: connection lifecycle, raw robot
// notifications, command outcomes. Entries fan out over a broadcast channel
// and the most recent ones are kept for late subscribers. Each entry is
// mirrored to `tracing` so it also lands in the diagnostic log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_BACKLOG: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    /// Raw robot notification text.
    Notification,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded, broadcasting activity log. Clones share one book.
#[derive(Clone)]
pub struct LogBook {
    inner: Arc<LogBookInner>,
}

struct LogBookInner {
    sender: broadcast::Sender<LogEntry>,
    backlog: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBook {
    pub fn new() -> Self {
        Self::with_backlog(DEFAULT_BACKLOG)
    }

    /// Keep at most `capacity` entries for [`recent`](Self::recent).
    pub fn with_backlog(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(LogBookInner {
                sender,
                backlog: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.sender.subscribe()
    }

    /// Retained entries, oldest first.
    pub fn recent(&self) -> Vec<LogEntry> {
        match self.inner.backlog.lock() {
            Ok(backlog) => backlog.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn record(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        };

        match level {
            LogLevel::Error => tracing::warn!(message = %entry.message, "logbook"),
            LogLevel::Notification => tracing::debug!(message = %entry.message, "logbook"),
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(level = %level, message = %entry.message, "logbook");
            }
        }

        {
            let mut backlog = match self.inner.backlog.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if self.inner.capacity > 0 {
                if backlog.len() == self.inner.capacity {
                    backlog.pop_front();
                }
                backlog.push_back(entry.clone());
            }
        }

        let _ = self.inner.sender.send(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.record(LogLevel::Success, message);
    }

    pub fn notification(&self, message: impl Into<String>) {
        self.record(LogLevel::Notification, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backlog_is_bounded_and_ordered() {
        let book = LogBook::with_backlog(2);
        book.info("one");
        book.success("two");
        book.error("three");

        let recent: Vec<_> = book.recent().into_iter().map(|e| e.message).collect();
        assert_eq!(recent, vec!["two", "three"]);
    }

    #[test]
    fn subscribers_receive_entries() {
        let book = LogBook::new();
        let mut rx = book.subscribe();
        book.notification("BLE NOTI: hello");

        let entry = rx.try_recv().ok();
        assert!(matches!(
            entry,
            Some(LogEntry { level: LogLevel::Notification, ref message, .. }) if message == "BLE NOTI: hello"
        ));
    }

    #[test]
    fn level_names() {
        assert_eq!(LogLevel::Notification.to_string(), "notification");
        assert_eq!("error".parse::<LogLevel>().ok(), Some(LogLevel::Error));
    }
}
