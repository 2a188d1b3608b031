//! Event command handlers.

use tabled::Tabled;

use robodash_core::{EventRecord, EventsSummaryResponse};

use crate::cli::{EventsArgs, EventsCommand};
use crate::error::CliError;
use crate::output::{self, or_dash};

use super::Context;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Ack")]
    ack: String,
}

impl From<&EventRecord> for EventRow {
    fn from(e: &EventRecord) -> Self {
        Self {
            time: or_dash(e.timestamp.as_deref()),
            category: or_dash(e.category.as_deref()),
            event_type: or_dash(e.event_type.as_deref()),
            description: e.description.clone().unwrap_or_default(),
            ack: if e.acknowledged { "yes" } else { "" }.into(),
        }
    }
}

fn summary_detail(resp: &EventsSummaryResponse) -> String {
    let s = &resp.summary;
    let counts = output::detail_table(&[
        ("Period", format!("{} h", s.period_hours)),
        ("Info", s.info.to_string()),
        ("Warning", s.warning.to_string()),
        ("Critical", s.critical.to_string()),
        ("Total", s.total.to_string()),
        ("Unacknowledged", s.unacknowledged.to_string()),
    ]);

    if resp.events.is_empty() {
        return counts;
    }

    let events = output::render_list(
        &crate::cli::OutputFormat::Table,
        &resp.events,
        |e| EventRow::from(e),
        |_| String::new(),
    );
    format!("{counts}\n{events}")
}

pub async fn handle(ctx: &Context<'_>, args: EventsArgs) -> Result<(), CliError> {
    match args.command {
        EventsCommand::Summary { hours } => {
            let resp = ctx.dashboard.events_summary(hours).await?;
            let out = output::render_single(&ctx.global.output, &resp, summary_detail, |r| {
                r.events
                    .iter()
                    .map(|e| e.description.clone().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("\n")
            });
            output::print_output(&out, ctx.global.quiet);
            Ok(())
        }
    }
}
