//! Clap derive structures for the `rapt-bridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rapt-bridge -- read-only RAPT cloud telemetry bridge
#[derive(Debug, Parser)]
#[command(
    name = "rapt-bridge",
    version,
    about = "Poll the RAPT cloud API and publish fermentation telemetry",
    long_about = "Polls the RAPT cloud API for temperature controllers, Pill hydrometers,\n\
        fermentation chambers and BrewZillas, and turns every device record\n\
        into named, typed entity values. Read-only: nothing is ever sent to a device.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "RAPT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Start the bridge and print entity updates until interrupted
    Run,

    /// Run one poll cycle and print every entity
    #[command(alias = "p")]
    Poll,

    /// Run one forced discovery and print the devices found
    #[command(alias = "d")]
    Discover,

    /// Manage bridge configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (secrets masked)
    Show,

    /// Store the API secret in the system keyring
    SetSecret {
        /// Account e-mail (defaults to account.username from the config)
        #[arg(long, short = 'u')]
        username: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
