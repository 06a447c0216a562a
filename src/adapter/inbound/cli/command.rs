//! Command-line interface definitions.
//!
//! Defines the CLI structure for the `fry` binary using `clap`. The CLI can
//! score a recorded loss feed once, score a live feed on stdin, and inspect
//! configuration and the buyer directory.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Loss aggregation, FRY minting, risk scoring and tranche matching
#[derive(Parser, Debug)]
#[command(name = "fry")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the fry CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a recorded loss feed and run one scoring cycle
    Run(RunArgs),

    /// Ingest JSON lines from stdin and score on a timer
    Stream(StreamArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List the configured buyer directory
    Buyers(ConfigPathArg),
}

/// Subcommands for `fry config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a new configuration file from template.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(default_value = DEFAULT_CONFIG)]
    pub path: PathBuf,
}

/// Arguments for `fry config init`.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the configuration file.
    #[arg(default_value = DEFAULT_CONFIG)]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `fry run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Loss feed: a JSON array or JSON lines of loss records.
    #[arg(short, long)]
    pub events: PathBuf,

    /// End of the scoring window (RFC 3339). Defaults to the newest event.
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,

    /// Also write the ingestion and cycle reports as JSON lines.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `fry stream`.
#[derive(Parser, Debug)]
pub struct StreamArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Records per ingestion batch.
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Scoring cadence in seconds (overrides scoring.interval_secs).
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Also write the ingestion and cycle reports as JSON lines.
    #[arg(long)]
    pub report: Option<PathBuf>,
}
