//! Telemetry command handlers.

use tabled::Tabled;

use robodash_core::{DashboardMetrics, TelemetrySample, TelemetryStats, TotalStats, speed_percent};

use crate::cli::{TelemetryArgs, TelemetryCommand};
use crate::error::CliError;
use crate::output::{self, or_dash};

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Speed")]
    speed: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Light")]
    light: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Obstacles")]
    obstacles: String,
}

impl From<&TelemetrySample> for SampleRow {
    fn from(s: &TelemetrySample) -> Self {
        // Same formatting as the live dashboard tiles.
        let mut m = DashboardMetrics::default();
        m.apply_sample(s);
        Self {
            time: or_dash(s.timestamp.as_deref()),
            speed: or_dash(m.speed),
            distance: or_dash(m.session_distance),
            range: or_dash(m.obstacle_range),
            light: or_dash(m.light),
            battery: or_dash(m.battery),
            mode: or_dash(m.mode),
            obstacles: or_dash(m.obstacle_events),
        }
    }
}

// ── Detail views ────────────────────────────────────────────────────

fn totals_detail(t: &TotalStats) -> String {
    output::detail_table(&[
        ("Distance", format!("{} m", t.total_distance_m)),
        ("Uptime", format!("{} h", t.total_uptime_hours)),
        ("Obstacles", t.total_obstacles.to_string()),
        ("Records", or_dash(t.total_records)),
        ("First record", or_dash(t.first_record.as_deref())),
        ("Last record", or_dash(t.last_record.as_deref())),
    ])
}

fn stats_detail(s: &TelemetryStats) -> String {
    output::detail_table(&[
        ("Period", format!("{} h", s.period_hours)),
        ("Records", format!("{} ({} in period)", s.total_records, s.last_period_records)),
        (
            "Speed avg/max/min",
            format!(
                "{}% / {}% / {}%",
                speed_percent(s.avg_speed_pwm),
                speed_percent(s.max_speed_pwm),
                speed_percent(s.min_speed_pwm)
            ),
        ),
        ("Distance", format!("{:.2} km", s.total_distance_km)),
        ("Avg range", format!("{:.1} cm", s.avg_distance_cm)),
        ("Obstacles", s.obstacle_count.to_string()),
        ("Battery avg/min", format!("{:.0}% / {:.0}%", s.avg_battery, s.min_battery)),
        ("Max uptime", format!("{} s", s.max_uptime)),
        (
            "Auto/manual samples",
            format!("{} / {}", s.mode_auto_count, s.mode_manual_count),
        ),
        ("Current mode", or_dash(s.current_mode.as_deref())),
        ("Last update", or_dash(s.last_update.as_deref())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context<'_>, args: TelemetryArgs) -> Result<(), CliError> {
    let global = ctx.global;

    match args.command {
        TelemetryCommand::Latest { limit } => {
            let samples = ctx.dashboard.latest_telemetry(Some(limit)).await?;
            let out = output::render_list(
                &global.output,
                &samples,
                |s| SampleRow::from(s),
                |s| or_dash(s.timestamp.as_deref()),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TelemetryCommand::Totals => {
            let totals = ctx.dashboard.refresh_totals().await?;
            let out = output::render_single(&global.output, &totals, totals_detail, |t| {
                format!(
                    "{} {} {}",
                    t.total_distance_m, t.total_uptime_hours, t.total_obstacles
                )
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TelemetryCommand::Stats { hours } => {
            let stats = ctx.dashboard.telemetry_stats(hours).await?;
            let out = output::render_single(&global.output, &stats, stats_detail, |s| {
                s.total_records.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
