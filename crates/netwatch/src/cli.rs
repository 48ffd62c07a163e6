//! Clap derive structures for the `netwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netwatch -- track router netwatch host status from the command line
#[derive(Debug, Parser)]
#[command(
    name = "netwatch",
    version,
    about = "Track the up/down status of router netwatch hosts",
    long_about = "Registers router connection profiles, polls each router's netwatch\n\
        table and keeps a per-profile history of monitored hosts with\n\
        up/down counts.",
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
    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "NETWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Router fetch timeout in seconds
    #[arg(long, env = "NETWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// State file holding profiles and devices
    #[arg(long, env = "NETWATCH_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Directory of `<address>.json` router exports
    #[arg(long, env = "NETWATCH_SOURCE_DIR", global = true)]
    pub source_dir: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn output(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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
    /// Manage router connection profiles
    #[command(alias = "profile", alias = "p")]
    Profiles(ProfilesArgs),

    /// Inspect monitored hosts
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show up/down counts for a profile
    Summary(SummaryArgs),

    /// Fetch, reconcile and summarize once
    Sync(SyncArgs),

    /// Poll a profile periodically until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROFILES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommand,
}

/// Credentials for an ad-hoc router connection.
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Router address (host or IP)
    #[arg(long)]
    pub address: Option<String>,

    /// Router username
    #[arg(long)]
    pub username: Option<String>,

    /// Router secret (prompted for when omitted)
    #[arg(long, env = "NETWATCH_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// List profiles, most recently updated first
    #[command(alias = "ls")]
    List,

    /// Show one profile
    Get {
        /// Profile id
        id: u64,
    },

    /// Register a router
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Router address (host or IP)
        #[arg(long)]
        address: String,

        /// Router username
        #[arg(long)]
        username: String,

        /// Router secret (prompted for when omitted)
        #[arg(long, env = "NETWATCH_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Mark the profile active
        #[arg(long)]
        active: bool,
    },

    /// Change selected fields of a profile
    Update {
        /// Profile id
        id: u64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        secret: Option<String>,

        /// Set or clear the active flag
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a profile that no longer owns any devices
    #[command(alias = "rm")]
    Delete {
        /// Profile id
        id: u64,
    },

    /// Check that a router answers with the given credentials
    Test {
        /// Profile id (or pass --address/--username/--secret)
        #[arg(conflicts_with_all = ["address", "username"])]
        id: Option<u64>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    All,
    Up,
    Down,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List a profile's hosts
    #[command(alias = "ls")]
    List {
        /// Profile id
        #[arg(long, short = 'p')]
        profile: u64,

        /// Case-insensitive match on address or label
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Only hosts in this state
        #[arg(long, default_value = "all")]
        status: StatusArg,
    },

    /// Show one host by local id
    Get {
        /// Device id
        id: u64,
    },

    /// Drop a host row; it reappears with a new id if still reported
    Forget {
        /// Device id
        id: u64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUMMARY / SYNC / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Profile id
    pub profile: u64,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Profile id; without it, every active profile is synced
    #[arg(conflicts_with_all = ["address", "username"])]
    pub profile: Option<u64>,

    /// Identify the profile by its stored credentials instead
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Profile id
    pub profile: u64,

    /// Seconds between polls [default: from config]
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup (--yes takes defaults)
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
