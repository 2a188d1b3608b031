mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use robodash_core::Dashboard;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "robodash", &mut std::io::stdout());
            Ok(())
        }

        // Classification is pure
        Command::Classify(args) => commands::classify::handle(&args, &cli.global),

        // All other commands talk to the backend
        cmd => {
            let cfg = config::load_config()?;
            let mut resolved = config::resolve(&cli.global, &cfg)?;

            if let Command::Watch(ref args) = cmd {
                if args.no_poll {
                    resolved.dashboard.telemetry_interval = std::time::Duration::ZERO;
                    resolved.dashboard.totals_interval = std::time::Duration::ZERO;
                }
            }

            let dashboard = Dashboard::new(resolved.dashboard)?;
            let ctx = commands::Context {
                dashboard: &dashboard,
                global: &cli.global,
                scan_timeout_secs: resolved.scan_timeout_secs,
            };

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &ctx).await;
            dashboard.shutdown().await;
            result
        }
    }
}
