//! skillsync CLI
//!
//! Installs package content and configuration fragments into the
//! directories of the active agent profiles.

mod cli;
mod commands;
mod error;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::ApplyScope;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Some(cmd) => execute_command(&root, cmd),
        None => {
            println!("{} agent content sync", "skillsync".green().bold());
            println!();
            println!("Run {} for available commands.", "skillsync --help".cyan());
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(root: &Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Apply {
            selection,
            state,
            content_only,
            config_only,
            json,
        } => commands::run_apply(
            root,
            &selection,
            &state,
            ApplyScope::from_flags(content_only, config_only),
            json,
        ),
        Commands::Clean { json } => commands::run_clean(root, json),
        Commands::Profiles { selection, all } => commands::run_profiles(root, &selection, all),
        Commands::Status { json } => commands::run_status(root, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn status_on_empty_project() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(commands::run_status(temp.path(), false).is_ok());
    }
}
