// ── Indicator board ──
//
// Owns the live `IndicatorState` behind a watch channel and the obstacle
// expiry timers. Every alarm arms a fresh timer tagged with a generation
// number; a timer may only clear the alarm if its generation is still the
// latest one. The generation is bumped and checked while holding the watch
// channel's write lock, so arm and expiry never interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use robodash_api::TelemetrySample;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::event::{EventTag, EventTags};
use crate::indicator::{IndicatorState, project, project_telemetry};

/// Observable indicator state plus the timers that age it.
///
/// Cheaply cloneable; clones share one state.
#[derive(Clone)]
pub struct IndicatorBoard {
    inner: Arc<BoardInner>,
}

struct BoardInner {
    state: watch::Sender<IndicatorState>,
    generation: AtomicU64,
    window: Duration,
    proximity_threshold_cm: f64,
    cancel: CancellationToken,
}

impl IndicatorBoard {
    pub fn new(window: Duration, proximity_threshold_cm: f64) -> Self {
        let (state, _) = watch::channel(IndicatorState::default());
        Self {
            inner: Arc::new(BoardInner {
                state,
                generation: AtomicU64::new(0),
                window,
                proximity_threshold_cm,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Apply classified tags and return the resulting state.
    ///
    /// `OBSTACLE_DETECTED` (re-)arms the alarm and starts an expiry of
    /// `window`. Must be called inside a Tokio runtime when the tags
    /// contain an obstacle.
    pub fn apply_tags(&self, tags: EventTags) -> IndicatorState {
        if tags.is_empty() {
            return self.current();
        }

        let mut armed = None;
        self.inner.state.send_if_modified(|state| {
            let next = project(tags, *state);
            if tags.contains(EventTag::ObstacleDetected) {
                armed = Some(self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1);
            }
            let changed = next != *state;
            *state = next;
            changed
        });

        if let Some(generation) = armed {
            self.spawn_expiry(generation);
        }
        self.current()
    }

    /// Apply one polled telemetry sample and return the resulting state.
    pub fn apply_telemetry(&self, sample: &TelemetrySample) -> IndicatorState {
        let threshold = self.inner.proximity_threshold_cm;
        self.inner.state.send_if_modified(|state| {
            let next = project_telemetry(sample, threshold, *state);
            let changed = next != *state;
            *state = next;
            changed
        });
        self.current()
    }

    pub fn current(&self) -> IndicatorState {
        *self.inner.state.borrow()
    }

    /// Watch indicator transitions.
    pub fn subscribe(&self) -> watch::Receiver<IndicatorState> {
        self.inner.state.subscribe()
    }

    /// Length of one obstacle alarm.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Drop every pending expiry. The current state is left as is.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn spawn_expiry(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let deadline = Instant::now() + inner.window;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = inner.cancel.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    let cleared = inner.state.send_if_modified(|state| {
                        if inner.generation.load(Ordering::SeqCst) != generation
                            || !state.obstacle.alarm
                        {
                            return false;
                        }
                        state.obstacle.alarm = false;
                        true
                    });
                    if cleared {
                        tracing::debug!(generation, "obstacle alarm expired");
                    }
                }
            }
        });
    }
}
