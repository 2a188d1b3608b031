//! Live view: follow the notification stream and telemetry pollers,
//! printing log book entries and indicator transitions until Ctrl-C.

use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use robodash_core::{ConnectionState, IndicatorState, LogEntry};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

enum Line<'a> {
    Log(&'a LogEntry),
    Indicators(IndicatorState),
    Connection(ConnectionState),
}

struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    fn emit(&self, line: &Line<'_>) {
        let text = match self.format {
            OutputFormat::Table | OutputFormat::Plain => match line {
                Line::Log(entry) => output::format_log_entry(entry, self.color),
                Line::Indicators(state) => output::format_indicators(*state, self.color),
                Line::Connection(state) => output::format_connection(*state, self.color),
            },
            OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
                let value = match line {
                    Line::Log(entry) => json!({ "kind": "log", "entry": entry }),
                    Line::Indicators(state) => json!({
                        "kind": "indicators",
                        "state": state,
                        "critical": state.critical(),
                    }),
                    Line::Connection(state) => json!({ "kind": "connection", "state": state }),
                };
                // One event per line regardless of the structured format.
                output::render_json_compact(&value)
            }
        };
        output::print_output(&text, self.quiet);
    }
}

pub async fn handle(ctx: &Context<'_>, args: &WatchArgs) -> Result<(), CliError> {
    let dashboard = ctx.dashboard;
    let printer = Printer {
        format: ctx.global.output.clone(),
        color: output::should_color(&ctx.global.color),
        quiet: ctx.global.quiet,
    };

    // Subscribe before starting so nothing is missed.
    let mut log = dashboard.log().subscribe();
    let mut indicators = dashboard.watch_indicators();
    let mut connection = dashboard.watch_connection();

    dashboard.start().await;
    printer.emit(&Line::Indicators(*indicators.borrow_and_update()));

    if args.connect {
        dashboard.connect_robot().await?;
    } else {
        dashboard.open_stream().await;
    }

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;

            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                break;
            }
            () = &mut deadline => break,

            entry = log.recv() => match entry {
                Ok(entry) => printer.emit(&Line::Log(&entry)),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "log view lagged");
                }
                Err(RecvError::Closed) => break,
            },

            changed = indicators.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *indicators.borrow_and_update();
                printer.emit(&Line::Indicators(state));
            }

            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                printer.emit(&Line::Connection(state));
            }
        }
    }

    dashboard.close_stream().await;
    Ok(())
}
