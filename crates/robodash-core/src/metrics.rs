// ── Dashboard metrics ──
//
// Display strings for the metric tiles, projected from polled telemetry.
// A field missing from a sample leaves its tile showing the last value.

use robodash_api::{TelemetrySample, TotalStats};
use serde::Serialize;

/// Rendered metric tiles. `None` means "never reported".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    // ── Session ─────────────────────────────────────────────────────
    pub speed: Option<String>,
    pub session_uptime: Option<String>,
    pub session_distance: Option<String>,
    pub obstacle_range: Option<String>,
    pub light: Option<String>,
    pub battery: Option<String>,
    pub mode: Option<String>,
    pub obstacle_events: Option<String>,
    /// Timestamp of the last applied sample, as the backend reported it.
    pub sampled_at: Option<String>,

    // ── Lifetime ────────────────────────────────────────────────────
    pub total_distance: Option<String>,
    pub total_uptime: Option<String>,
    pub total_obstacles: Option<String>,
}

impl DashboardMetrics {
    pub fn apply_sample(&mut self, sample: &TelemetrySample) {
        if let Some(pwm) = sample.speed_pwm {
            self.speed = Some(format!("{}%", speed_percent(pwm)));
        }
        if let Some(uptime) = sample.uptime_s {
            self.session_uptime = Some(format!("{uptime}s"));
        }
        if let Some(cm) = sample.dist_traveled_cm {
            self.session_distance = Some(format_meters(cm));
        }
        if let Some(cm) = sample.distance_cm {
            self.obstacle_range = Some(format_meters(cm));
        }
        if let Some(lux) = sample.light_level {
            self.light = Some(format!("{lux} lux"));
        }
        if let Some(level) = sample.battery_level {
            self.battery = Some(format!("{level}%"));
        }
        if let Some(mode) = sample.mode.as_deref().filter(|m| !m.is_empty()) {
            self.mode = Some(mode.to_owned());
        }
        if let Some(count) = sample.obstacle_events {
            self.obstacle_events = Some(count.to_string());
        }
        if let Some(ts) = &sample.timestamp {
            self.sampled_at = Some(ts.clone());
        }
    }

    pub fn apply_totals(&mut self, totals: &TotalStats) {
        self.total_distance = Some(format!("{} m", totals.total_distance_m));
        self.total_uptime = Some(format!("{} h", totals.total_uptime_hours));
        self.total_obstacles = Some(totals.total_obstacles.to_string());
    }
}

/// PWM duty (0–255) as a rounded percentage.
pub fn speed_percent(pwm: f64) -> f64 {
    (pwm / 255.0 * 100.0).round()
}

/// Centimeters as meters with two decimals: `250 → "2.50 m"`.
///
/// Exact midpoints round away from zero (`12.5 → "0.13 m"`), not to even.
pub fn format_meters(cm: f64) -> String {
    format!("{:.2} m", round_centi(cm / 100.0))
}

/// Nudge `x` off an exact hundredths midpoint so `{:.2}` rounds it away
/// from zero. Anything else passes through untouched.
fn round_centi(x: f64) -> f64 {
    let doubled = x * 200.0;
    // The product must be exact for the midpoint test to mean anything.
    let exact = x.mul_add(200.0, -doubled) == 0.0;
    let odd_integer = doubled.fract() == 0.0 && doubled % 2.0 != 0.0;
    if exact && odd_integer {
        (doubled + doubled.signum()) / 2.0 / 100.0
    } else {
        x
    }
}
