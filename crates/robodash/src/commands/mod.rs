//! Command dispatch: bridges CLI args -> dashboard operations -> output formatting.

pub mod classify;
pub mod config_cmd;
pub mod events;
pub mod robot;
pub mod system;
pub mod telemetry;
pub mod watch;

use robodash_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Everything a backend-bound handler needs.
pub struct Context<'a> {
    pub dashboard: &'a Dashboard,
    pub global: &'a GlobalOpts,
    pub scan_timeout_secs: u64,
}

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Connect => robot::connect(ctx).await,
        Command::Disconnect => robot::disconnect(ctx).await,
        Command::Status => robot::status(ctx).await,
        Command::Scan(args) => robot::scan(ctx, &args).await,
        Command::Message(args) => robot::message(ctx, &args).await,
        Command::Image(args) => robot::image(ctx, args).await,
        Command::Health => system::health(ctx).await,
        Command::Info => system::info(ctx).await,
        Command::Telemetry(args) => telemetry::handle(ctx, args).await,
        Command::Events(args) => events::handle(ctx, args).await,
        Command::Watch(args) => watch::handle(ctx, &args).await,
        // Config, Completions and Classify are handled before dispatch
        Command::Config(_) | Command::Completions(_) | Command::Classify(_) => unreachable!(),
    }
}
