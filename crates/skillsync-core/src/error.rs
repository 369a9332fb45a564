//! Error types for skillsync-core

use crate::content::Conflict;
use std::path::PathBuf;

/// Result type for skillsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in skillsync-core operations
///
/// Only conditions that fail an operation are errors. Skipped items,
/// missing sources and unreadable documents are reported as warnings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two or more packages target the same destination
    #[error("{} destination conflict(s): {}", conflicts.len(), format_conflicts(conflicts))]
    ContentConflict { conflicts: Vec<Conflict> },

    /// A settings layer could not be used
    #[error("Invalid settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },

    /// Desired-state document is invalid
    #[error("Invalid desired state in {path}: {message}")]
    DesiredState { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from skillsync-fs
    #[error(transparent)]
    Fs(#[from] skillsync_fs::Error),

    /// Managed block error from skillsync-blocks
    #[error(transparent)]
    Blocks(#[from] skillsync_blocks::Error),

    /// Profile error from skillsync-profiles
    #[error(transparent)]
    Profiles(#[from] skillsync_profiles::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
