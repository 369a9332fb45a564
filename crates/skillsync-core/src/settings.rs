//! Layered settings
//!
//! Settings are loaded from up to three TOML layers, later layers
//! overriding earlier ones with tables merged deeply:
//!
//! 1. Global (`<config_dir>/skillsync/config.toml`)
//! 2. Project (`skillsync.toml`)
//! 3. Local overrides (`skillsync.local.toml`), not meant to be committed
//!
//! Missing layers are skipped. Malformed TOML in any layer is an error.

use crate::content::PrefixPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use skillsync_fs::{ConfigStore, NormalizedPath, ProjectPath};
use skillsync_profiles::{ProfileDefinition, ProfileRegistry};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Effective settings of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default profile list, used when nothing is given or detected
    pub profiles: Vec<String>,
    /// Detect profiles from their marker directories
    pub auto_detect: bool,
    /// Emit the per-package legacy manifest view
    pub legacy_manifest: bool,
    pub prefix: PrefixPolicy,
    /// Registry extensions and overrides, keyed by profile id
    pub profile: BTreeMap<String, ProfileDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            auto_detect: true,
            legacy_manifest: false,
            prefix: PrefixPolicy::default(),
            profile: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Built-in registry extended with the configured profiles.
    pub fn registry(&self) -> Result<ProfileRegistry> {
        let mut registry = ProfileRegistry::with_builtins();
        registry.apply_definitions(&self.profile)?;
        Ok(registry)
    }
}

/// Loads [`Settings`] for a project root.
pub struct SettingsLoader {
    root: NormalizedPath,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl SettingsLoader {
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            root,
            global_config_dir_override: None,
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_config_dir(root: NormalizedPath, global_config_dir: PathBuf) -> Self {
        Self {
            root,
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("skillsync"))
    }

    /// Layer paths, lowest priority first.
    pub fn layers(&self) -> Vec<NormalizedPath> {
        let mut layers = Vec::with_capacity(3);
        if let Some(global_dir) = self.global_config_dir() {
            layers.push(NormalizedPath::new(global_dir.join("config.toml")));
        }
        layers.push(self.root.join(ProjectPath::Settings.as_str()));
        layers.push(self.root.join(ProjectPath::LocalSettings.as_str()));
        layers
    }

    /// Load and merge all layers.
    pub fn load(&self) -> Result<Settings> {
        let store = ConfigStore::new();
        let mut merged = toml::Table::new();

        for layer in self.layers() {
            match store.load_optional::<toml::Table>(&layer) {
                Ok(Some(table)) => {
                    tracing::debug!(path = %layer, "Loading settings layer");
                    deep_merge(&mut merged, table);
                }
                Ok(None) => tracing::debug!(path = %layer, "No settings layer, skipping"),
                Err(skillsync_fs::Error::ConfigParse { path, message, .. }) => {
                    return Err(Error::Settings { path, message });
                }
                Err(e) => return Err(e.into()),
            }
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| Error::Settings {
                path: self.root.join(ProjectPath::Settings.as_str()).to_native(),
                message: e.to_string(),
            })
    }
}

/// Merge `overlay` into `base`. Tables merge recursively; any other value
/// (arrays included) replaces the base value.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => {
                if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                    deep_merge(base_table, overlay_table);
                } else {
                    base.insert(key, toml::Value::Table(overlay_table));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
