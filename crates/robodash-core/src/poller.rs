// ── Telemetry polling ──
//
// Periodic fetches that run alongside the notification stream and do not
// depend on it. Both tasks fetch immediately on start, then every period.
// A failed fetch is logged and the next tick tries again.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dashboard::Dashboard;

/// Latest sample → metric tiles and proximity/mode indicators.
pub(crate) async fn telemetry_poll_task(
    dashboard: Dashboard,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match dashboard.refresh_telemetry().await {
                    Ok(Some(_)) => debug!("telemetry_poll: sample applied"),
                    Ok(None) => debug!("telemetry_poll: no sample yet"),
                    Err(e) => warn!(error = %e, "telemetry_poll: fetch failed"),
                }
            }
        }
    }
    debug!("telemetry_poll_task exiting");
}

/// Lifetime totals → totals tiles.
pub(crate) async fn totals_poll_task(
    dashboard: Dashboard,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = dashboard.refresh_totals().await {
                    warn!(error = %e, "totals_poll: fetch failed");
                }
            }
        }
    }
    debug!("totals_poll_task exiting");
}
