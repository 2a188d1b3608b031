//! Offline classification of notification text.

use serde::Serialize;

use robodash_core::{EventTags, IndicatorState, classify_text, project};

use crate::cli::{ClassifyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Classification<'a> {
    text: &'a str,
    tags: EventTags,
    /// Indicators after applying the tags to an all-off panel.
    indicators: IndicatorState,
}

fn tag_list(tags: EventTags) -> String {
    if tags.is_empty() {
        return "(none)".into();
    }
    tags.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn detail(c: &Classification<'_>) -> String {
    let on = |b: bool| if b { "on" } else { "off" }.to_owned();
    output::detail_table(&[
        ("Tags", tag_list(c.tags)),
        ("Auto", on(c.indicators.auto)),
        ("Manual", on(c.indicators.manual)),
        ("Headlights", on(c.indicators.headlights)),
        ("Obstacle", on(c.indicators.critical())),
    ])
}

#[allow(clippy::unnecessary_wraps)]
pub fn handle(args: &ClassifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let tags = classify_text(&args.text);
    let result = Classification {
        text: &args.text,
        tags,
        indicators: project(tags, IndicatorState::default()),
    };

    let out = output::render_single(&global.output, &result, detail, |c| {
        c.tags
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use robodash_core::EventTag;

    use super::*;

    #[test]
    fn tag_list_joins_in_table_order() {
        let tags: EventTags = [EventTag::HeadlightsOn, EventTag::AutoMode].into_iter().collect();
        assert_eq!(tag_list(tags), "AUTO_MODE, HEADLIGHTS_ON");
        assert_eq!(tag_list(EventTags::EMPTY), "(none)");
    }
}
