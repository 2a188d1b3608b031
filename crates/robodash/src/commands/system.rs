//! Backend service commands: health, info.

use robodash_core::{HealthStatus, SystemInfo};

use crate::error::CliError;
use crate::output::{self, or_dash};

use super::Context;

fn health_detail(h: &HealthStatus) -> String {
    output::detail_table(&[
        ("Status", h.status.clone()),
        ("Message", or_dash(h.message.as_deref())),
        ("Version", or_dash(h.version.as_deref())),
    ])
}

fn info_detail(i: &SystemInfo) -> String {
    output::detail_table(&[
        ("Platform", or_dash(i.platform.as_deref())),
        ("Architecture", or_dash(i.architecture.as_deref())),
        ("Host", or_dash(i.node.as_deref())),
        ("Python", or_dash(i.python_version.as_deref())),
    ])
}

/// Print the backend's health report. Anything but `healthy` fails the
/// command so scripts can gate on the exit code.
pub async fn health(ctx: &Context<'_>) -> Result<(), CliError> {
    let health = ctx.dashboard.health().await?;
    let out = output::render_single(&ctx.global.output, &health, health_detail, |h| {
        h.status.clone()
    });
    output::print_output(&out, ctx.global.quiet);

    if health.is_healthy() {
        Ok(())
    } else {
        Err(CliError::ApiError {
            message: format!("backend reports status '{}'", health.status),
            status: None,
        })
    }
}

pub async fn info(ctx: &Context<'_>) -> Result<(), CliError> {
    let info = ctx.dashboard.system_info().await?;
    let out = output::render_single(&ctx.global.output, &info, info_detail, |i| {
        or_dash(i.node.as_deref())
    });
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
