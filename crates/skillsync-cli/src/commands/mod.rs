//! Command implementations for skillsync-cli

pub mod apply;
pub mod profiles;
pub mod status;

pub use apply::{run_apply, run_clean, ApplyScope};
pub use profiles::run_profiles;
pub use status::run_status;

use std::path::Path;

use colored::Colorize;
use skillsync_core::{OperationReport, SettingsLoader, SyncEngine};
use skillsync_fs::{NormalizedPath, io};

use crate::cli::SelectionArgs;
use crate::error::{CliError, Result};

/// Canonical project root, so recorded absolute paths compare equal.
pub fn project_root(path: &Path) -> Result<NormalizedPath> {
    if !path.is_dir() {
        return Err(CliError::user(format!(
            "Project root {} is not a directory",
            path.display()
        )));
    }
    Ok(io::canonical_root(path)?)
}

/// Build an engine from the layered settings of `path`.
///
/// `--no-detect` overrides the `auto_detect` setting.
pub fn open_engine(path: &Path, selection: &SelectionArgs) -> Result<SyncEngine> {
    let root = project_root(path)?;
    let mut settings = SettingsLoader::new(root.clone()).load()?;
    if selection.no_detect {
        settings.auto_detect = false;
    }
    Ok(SyncEngine::new(root, settings)?)
}

/// Print a report and turn a failed one into an error.
pub fn finish_report(report: &OperationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }

    if report.success {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} failed with {} error(s)",
            report.operation,
            report.errors.len()
        )))
    }
}

fn print_report(report: &OperationReport) {
    if report.success {
        if report.actions.is_empty() {
            println!("{} Already up to date. No changes needed.", "OK".green().bold());
        } else {
            println!("{} {} complete:", "OK".green().bold(), report.operation);
            for action in &report.actions {
                println!("   {} {}", "+".green(), action);
            }
        }
    } else {
        println!("{} {} failed:", "FAILED".red().bold(), report.operation);
        for error in &report.errors {
            println!("   {} {}", "!".red(), error);
        }
        if !report.actions.is_empty() {
            println!();
            println!("Completed before the failure:");
            for action in &report.actions {
                println!("   {} {}", "+".green(), action);
            }
        }
    }

    if !report.warnings.is_empty() {
        println!();
        for warning in &report.warnings {
            println!("{} {}", "warning:".yellow().bold(), warning);
        }
    }
}
