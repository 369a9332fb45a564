//! Apply and clean command implementations

use std::path::Path;

use colored::Colorize;
use skillsync_core::{DesiredState, OperationReport};
use skillsync_fs::NormalizedPath;

use super::{finish_report, open_engine};
use crate::cli::SelectionArgs;
use crate::error::{CliError, Result};

/// Which phases `apply` runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyScope {
    All,
    ContentOnly,
    ConfigOnly,
}

impl ApplyScope {
    pub fn from_flags(content_only: bool, config_only: bool) -> Self {
        match (content_only, config_only) {
            (true, _) => Self::ContentOnly,
            (_, true) => Self::ConfigOnly,
            _ => Self::All,
        }
    }
}

/// Run the apply command
///
/// Resolves the active profiles, loads the desired state and reconciles
/// the project against it.
pub fn run_apply(
    path: &Path,
    selection: &SelectionArgs,
    state: &Path,
    scope: ApplyScope,
    json: bool,
) -> Result<()> {
    let engine = open_engine(path, selection)?;

    let state_path = NormalizedPath::new(path.join(state));
    if !state_path.is_file() {
        return Err(CliError::user(format!(
            "Desired state not found at {state_path}; pass --state <file>"
        )));
    }
    let desired = DesiredState::load(&state_path)?;

    let resolved = engine.resolve_profiles(selection.profiles.as_deref());
    tracing::info!(profiles = ?resolved.ids, source = ?resolved.source, "Resolved profiles");
    if !json {
        let active = if resolved.is_empty() {
            "none".dimmed().to_string()
        } else {
            resolved.ids.join(", ").cyan().to_string()
        };
        println!("{} Applying for profiles: {}", "=>".blue().bold(), active);
    }

    let mut report = OperationReport::new("apply");
    for warning in &resolved.warnings {
        report.warn(warning.clone());
    }
    report.absorb(match scope {
        ApplyScope::All => engine.apply(&resolved.ids, &desired),
        ApplyScope::ContentOnly => engine.apply_content(&resolved.ids, &desired.items),
        ApplyScope::ConfigOnly => engine.apply_config(&resolved.ids, &desired.fragments),
    });

    finish_report(&report, json)
}

/// Run the clean command
///
/// Undoes both phases from the manifest alone.
pub fn run_clean(path: &Path, json: bool) -> Result<()> {
    let engine = open_engine(path, &SelectionArgs::default())?;
    if !json {
        println!("{} Removing managed content and configuration...", "=>".blue().bold());
    }
    let report = engine.undo();
    finish_report(&report, json)
}
