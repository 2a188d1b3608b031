// ── Indicator projection ──
//
// Pure state transitions for the dashboard indicators. `project` folds a
// set of event tags into the prior state; `project_telemetry` folds one
// telemetry sample. Timers live in `board`, never here.

use robodash_api::TelemetrySample;
use serde::Serialize;

use crate::event::{EventTag, EventTags};

/// Obstacle indicator inputs.
///
/// `alarm` is edge-triggered by `OBSTACLE_DETECTED` notifications and
/// cleared by the board's expiry timer. `proximity` is level-triggered by
/// the polled range reading. Either one holds the indicator critical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ObstacleIndicator {
    pub alarm: bool,
    pub proximity: bool,
}

impl ObstacleIndicator {
    pub fn critical(self) -> bool {
        self.alarm || self.proximity
    }
}

/// Snapshot of every dashboard indicator.
///
/// `auto` and `manual` are never both set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorState {
    pub auto: bool,
    pub manual: bool,
    pub headlights: bool,
    pub obstacle: ObstacleIndicator,
}

impl IndicatorState {
    /// Whether the obstacle indicator shows critical.
    pub fn critical(&self) -> bool {
        self.obstacle.critical()
    }

    fn set_auto(&mut self) {
        self.auto = true;
        self.manual = false;
    }

    fn set_manual(&mut self) {
        self.auto = false;
        self.manual = true;
    }
}

/// Apply event tags to `prior`. Tags absent from the set leave their
/// indicator untouched; tags apply in table order.
pub fn project(tags: EventTags, prior: IndicatorState) -> IndicatorState {
    let mut next = prior;
    for tag in tags.iter() {
        match tag {
            EventTag::AutoMode => next.set_auto(),
            EventTag::ManualMode => next.set_manual(),
            EventTag::HeadlightsOn => next.headlights = true,
            EventTag::HeadlightsOff => next.headlights = false,
            EventTag::ObstacleDetected => next.obstacle.alarm = true,
        }
    }
    next
}

/// Apply one polled telemetry sample to `prior`.
///
/// A reported range below `threshold_cm` holds the proximity input; any
/// other reported range releases it. A reported mode containing `auto` or
/// `manu` selects that mode. Missing fields change nothing.
pub fn project_telemetry(
    sample: &TelemetrySample,
    threshold_cm: f64,
    prior: IndicatorState,
) -> IndicatorState {
    let mut next = prior;

    if let Some(distance) = sample.distance_cm {
        next.obstacle.proximity = distance < threshold_cm;
    }

    if let Some(mode) = sample.mode.as_deref() {
        let mode = mode.to_lowercase();
        if mode.contains("auto") {
            next.set_auto();
        } else if mode.contains("manu") {
            next.set_manual();
        }
    }

    next
}
