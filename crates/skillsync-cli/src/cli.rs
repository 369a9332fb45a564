//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Desired-state document used when `--state` is not given
pub const DEFAULT_STATE_FILE: &str = "skillsync.state.json";

/// skillsync - Keep agent content and configuration in sync across tools
#[derive(Parser, Debug)]
#[command(name = "skillsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Profile selection shared by commands that resolve profiles
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionArgs {
    /// Comma separated profile ids; empty or "none" selects no profile
    #[arg(short, long, env = "SKILLSYNC_PROFILES", value_name = "IDS")]
    pub profiles: Option<String>,

    /// Do not detect profiles from their marker directories
    #[arg(long)]
    pub no_detect: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install content and merge configuration for the active profiles
    ///
    /// Examples:
    ///   skillsync apply                       # Detect profiles from markers
    ///   skillsync apply -p claude,cursor      # Explicit profiles
    ///   skillsync apply --state deps.yaml     # Another desired-state document
    ///   skillsync apply --content-only        # Skip configuration merging
    Apply {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Desired-state document (JSON, YAML or TOML)
        #[arg(long, value_name = "FILE", default_value = DEFAULT_STATE_FILE)]
        state: PathBuf,

        /// Only reconcile content files
        #[arg(long, conflicts_with = "config_only")]
        content_only: bool,

        /// Only merge configuration fragments
        #[arg(long)]
        config_only: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove everything skillsync installed
    Clean {
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved profiles and their paths
    Profiles {
        #[command(flatten)]
        selection: SelectionArgs,

        /// List every registered profile, marking the active ones
        #[arg(long)]
        all: bool,
    },

    /// Summarise what the manifest records
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
