//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Add `profile` under `name`, making it the default when none is set.
fn insert_profile(
    cfg: &mut Config,
    name: &str,
    profile: Profile,
    force: bool,
) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!("profile '{name}' already exists (use --force to replace it)"),
        });
    }

    // Reject unusable profiles before they reach disk.
    config::profile_to_dashboard_config(&profile, &cfg.defaults)?;

    cfg.profiles.insert(name.to_owned(), profile);
    let has_default = cfg
        .default_profile
        .as_ref()
        .is_some_and(|d| cfg.profiles.contains_key(d));
    if !has_default {
        cfg.default_profile = Some(name.to_owned());
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            backend,
            name,
            force,
        } => {
            let mut cfg = config::load_config()?;
            insert_profile(&mut cfg, &name, Profile::new(backend), force)?;
            let path = config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!("✓ Profile '{name}' written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to serialize config: {e}"),
                    })?,
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| {
                    String::new()
                }),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
