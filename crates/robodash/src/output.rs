//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use robodash_core::{ConnectionState, IndicatorState, LogEntry, LogLevel};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// One log book line: `[HH:MM:SS] message`, colored by level.
pub fn format_log_entry(entry: &LogEntry, color: bool) -> String {
    let stamp = entry.timestamp.format("%H:%M:%S").to_string();
    if !color {
        return format!("[{stamp}] {}", entry.message);
    }

    let message = match entry.level {
        LogLevel::Info => entry.message.clone(),
        LogLevel::Success => entry.message.green().to_string(),
        LogLevel::Notification => entry.message.cyan().to_string(),
        LogLevel::Error => entry.message.red().bold().to_string(),
    };
    format!("{} {message}", format!("[{stamp}]").dimmed())
}

fn lamp(label: &str, on: bool, color: bool) -> String {
    match (on, color) {
        (true, true) => format!("{}", format!("● {label}").green()),
        (false, true) => format!("{}", format!("○ {label}").dimmed()),
        (true, false) => format!("[x] {label}"),
        (false, false) => format!("[ ] {label}"),
    }
}

/// Single-line indicator panel.
pub fn format_indicators(state: IndicatorState, color: bool) -> String {
    let obstacle = if state.critical() {
        if color {
            "● OBSTACLE".red().bold().to_string()
        } else {
            "[!] OBSTACLE".into()
        }
    } else {
        lamp("obstacle", false, color)
    };

    format!(
        "{}  {}  {}  {obstacle}",
        lamp("auto", state.auto, color),
        lamp("manual", state.manual, color),
        lamp("headlights", state.headlights, color),
    )
}

pub fn format_connection(state: ConnectionState, color: bool) -> String {
    let label = match state {
        ConnectionState::Disconnected => "Disconnected",
        ConnectionState::Connecting => "Connecting",
        ConnectionState::Connected => "Connected",
        ConnectionState::Reconnecting => "Reconnecting",
    };
    if !color {
        return format!("stream: {label}");
    }
    match state {
        ConnectionState::Connected => format!("stream: {}", label.green()),
        ConnectionState::Disconnected => format!("stream: {}", label.red()),
        _ => format!("stream: {}", label.yellow()),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one value per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Detail views ─────────────────────────────────────────────────────

#[derive(Tabled)]
struct KeyValue<'a> {
    #[tabled(rename = "Field")]
    key: &'a str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Two-column table for single-item detail views.
pub fn detail_table(fields: &[(&str, String)]) -> String {
    let rows: Vec<KeyValue<'_>> = fields
        .iter()
        .map(|(key, value)| KeyValue {
            key,
            value: value.clone(),
        })
        .collect();
    render_table(&rows)
}

/// `Some(v)` rendered with `Display`, `None` as a dash.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-printed JSON.
pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        render_json_compact(data)
    } else {
        render_json_pretty(data)
    }
}

/// YAML output.
pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}

#[cfg(test)]
mod tests {
    use robodash_core::ObstacleIndicator;

    use super::*;

    #[test]
    fn plain_indicators_mark_active_lamps() {
        let state = IndicatorState {
            auto: true,
            headlights: true,
            obstacle: ObstacleIndicator {
                alarm: true,
                proximity: false,
            },
            ..IndicatorState::default()
        };
        assert_eq!(
            format_indicators(state, false),
            "[x] auto  [ ] manual  [x] headlights  [!] OBSTACLE"
        );
    }

    #[test]
    fn detail_table_has_headers() {
        let table = detail_table(&[("Speed", "50%".into())]);
        assert!(table.contains("Field"));
        assert!(table.contains("50%"));
    }

    #[test]
    fn or_dash_fills_missing() {
        assert_eq!(or_dash(None::<u32>), "-");
        assert_eq!(or_dash(Some(3)), "3");
    }
}
