//! Fixed project-relative locations used by skillsync.

use std::path::Path;

/// Well-known paths inside a project managed by skillsync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPath {
    /// The `.skillsync` state directory
    StateDir,
    /// The unified tracked manifest
    Manifest,
    /// Directory holding the derived per-package legacy manifests
    LegacyPackagesDir,
    /// Project settings file
    Settings,
    /// Uncommitted local settings overrides
    LocalSettings,
    /// Per-directory ignore file receiving managed hints
    IgnoreFile,
}

impl ProjectPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateDir => ".skillsync",
            Self::Manifest => ".skillsync/manifest.json",
            Self::LegacyPackagesDir => ".skillsync/packages",
            Self::Settings => "skillsync.toml",
            Self::LocalSettings => "skillsync.local.toml",
            Self::IgnoreFile => ".gitignore",
        }
    }
}

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
