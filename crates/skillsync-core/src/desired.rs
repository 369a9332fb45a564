//! Desired-state input
//!
//! What a run should ship: content items and fragment documents. The
//! document is produced by whatever front end decides what to ship and is
//! read with [`ConfigStore`], so JSON, YAML and TOML all work.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use skillsync_fs::{ConfigStore, NormalizedPath};

/// One declared content file or directory.
///
/// Paths may be absolute or relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentItem {
    /// File (or directory, expanded recursively) to ship
    pub source_path: String,
    /// Owning package
    pub package_id: Option<String>,
    /// Directory the destination path is computed relative to
    pub source_root: Option<String>,
    /// Explicit prefix; an empty string disables prefixing
    pub prefix: Option<String>,
    /// Per-item prefix opt-in (`true`) or opt-out (`false`)
    pub use_prefix: Option<bool>,
    /// Prefix suggested by the package author
    pub suggested_prefix: Option<String>,
    /// `false` skips the item
    pub enabled: Option<bool>,
}

impl ContentItem {
    pub fn new(
        package_id: impl Into<String>,
        source_root: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            package_id: Some(package_id.into()),
            source_root: Some(source_root.into()),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_use_prefix(mut self, use_prefix: bool) -> Self {
        self.use_prefix = Some(use_prefix);
        self
    }

    pub fn with_suggested_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.suggested_prefix = Some(prefix.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = Some(false);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// A fragment document to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FragmentSource {
    /// Contributing package; defaults to the document path
    pub package_id: Option<String>,
    pub path: String,
}

impl FragmentSource {
    pub fn new(package_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            package_id: Some(package_id.into()),
            path: path.into(),
        }
    }

    /// Package id used in reports.
    pub fn package(&self) -> &str {
        self.package_id.as_deref().unwrap_or(&self.path)
    }
}

/// Everything a run should ship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesiredState {
    pub items: Vec<ContentItem>,
    pub fragments: Vec<FragmentSource>,
}

impl DesiredState {
    /// Load a desired-state document; format follows the extension.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        ConfigStore::new().load(path).map_err(|e| match e {
            skillsync_fs::Error::ConfigParse { path, message, .. } => {
                Error::DesiredState { path, message }
            }
            other => Error::Fs(other),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.fragments.is_empty()
    }
}

/// Resolve an input path against the project root.
pub(crate) fn resolve_input(root: &NormalizedPath, raw: &str) -> NormalizedPath {
    let path = NormalizedPath::new(raw);
    if path.is_absolute() {
        path
    } else {
        root.join(path.as_str())
    }
}
