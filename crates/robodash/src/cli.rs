//! Clap derive structures for the `robodash` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// robodash -- terminal dashboard for a Bluetooth robot
#[derive(Debug, Parser)]
#[command(
    name = "robodash",
    version,
    about = "Drive and monitor a Bluetooth robot from the command line",
    long_about = "Talks to the robot's dashboard backend over HTTP for commands and\n\
        telemetry, and listens to its WebSocket notification stream for\n\
        mode, headlight and obstacle events.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "ROBODASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "ROBODASH_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ROBODASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ROBODASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ROBODASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask the backend to connect to the robot and open the notification stream
    Connect,

    /// Drop the robot link
    Disconnect,

    /// Show the BLE link status
    #[command(alias = "st")]
    Status,

    /// Scan for nearby BLE devices
    Scan(ScanArgs),

    /// Scroll a short text on the robot's LED matrix
    #[command(alias = "msg")]
    Message(MessageArgs),

    /// Show a preset or custom image on the LED matrix
    #[command(alias = "img")]
    Image(ImageArgs),

    /// Check that the dashboard backend is up
    Health,

    /// Show the backend host's platform details
    Info,

    /// Telemetry history and aggregates
    #[command(alias = "tm")]
    Telemetry(TelemetryArgs),

    /// Backend event log
    Events(EventsArgs),

    /// Follow the live notification stream and telemetry
    Watch(WatchArgs),

    /// Classify notification text offline
    Classify(ClassifyArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Robot Link ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Scan duration in seconds (defaults to the profile's scan_timeout_secs)
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct MessageArgs {
    /// Text to display (1 to 15 characters)
    pub text: String,
}

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("image")
        .required(true)
        .args(["name", "data", "list"])
))]
pub struct ImageArgs {
    /// Preset image name (e.g. "heart", "smile")
    pub name: Option<String>,

    /// Custom 8x16 bitmap as 16 comma-separated bytes (decimal, 0x.. or 0b..)
    #[arg(long, value_parser = parse_byte, value_delimiter = ',')]
    pub data: Option<Vec<u8>>,

    /// List the preset names the backend knows instead of sending an image
    #[arg(long, short = 'l')]
    pub list: bool,
}

/// Parse one bitmap byte: `255`, `0xff` or `0b11111111`.
pub fn parse_byte(raw: &str) -> Result<u8, String> {
    let raw = raw.trim();
    let parsed = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else if let Some(bin) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
        u8::from_str_radix(bin, 2)
    } else {
        raw.parse::<u8>()
    };
    parsed.map_err(|e| format!("'{raw}' is not a byte: {e}"))
}

// ── Telemetry ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TelemetryArgs {
    #[command(subcommand)]
    pub command: TelemetryCommand,
}

#[derive(Debug, Subcommand)]
pub enum TelemetryCommand {
    /// Most recent samples
    Latest {
        /// Number of samples to fetch
        #[arg(long, short = 'n', default_value = "1")]
        limit: u32,
    },

    /// Lifetime totals
    Totals,

    /// Aggregates over a recent period
    Stats {
        /// Period in hours
        #[arg(long, default_value = "24")]
        hours: u32,
    },
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// Counts by severity plus the recent events
    Summary {
        /// Period in hours
        #[arg(long, default_value = "24")]
        hours: u32,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Connect the robot before listening
    #[arg(long)]
    pub connect: bool,

    /// Do not poll telemetry; follow the notification stream only
    #[arg(long)]
    pub no_poll: bool,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long, short = 'd')]
    pub duration: Option<u64>,
}

// ── Classify ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Notification text, e.g. "EVENT:OBSTACLE_DETECTED"
    pub text: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a profile to the config file
    Init {
        /// Backend URL for the new profile
        #[arg(long, default_value = "http://localhost:8000")]
        backend: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
