//! Tracked manifest persistence
//!
//! The manifest is the single record of everything skillsync wrote: the
//! files each package owns per profile, and the configuration entries it
//! manages per profile. Undo is driven entirely from it.
//!
//! On disk it lives at `.skillsync/manifest.json`. Paths are stored
//! relative to the project root with forward slashes so the file can be
//! committed and shared across machines.

use crate::Result;
use serde::{Deserialize, Serialize};
use skillsync_fs::{ConfigStore, NormalizedPath, ProjectPath, io};
use std::collections::{BTreeMap, BTreeSet};

/// Current manifest format version
pub const MANIFEST_VERSION: u32 = 1;

/// Files one package wrote, per profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Profile id -> project-relative destination paths
    #[serde(default)]
    pub files: BTreeMap<String, BTreeSet<String>>,
}

impl PackageRecord {
    pub fn is_empty(&self) -> bool {
        self.files.values().all(BTreeSet::is_empty)
    }

    /// All paths across profiles.
    pub fn all_files(&self) -> BTreeSet<&str> {
        self.files
            .values()
            .flat_map(|paths| paths.iter().map(String::as_str))
            .collect()
    }
}

/// Configuration entries managed in one profile's document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    /// Project-relative document path
    pub path: String,
    /// Entry names written by the last merge
    #[serde(default)]
    pub managed_keys: BTreeSet<String>,
}

/// The durable record of managed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedManifest {
    pub version: u32,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageRecord>,
    #[serde(default)]
    pub config: BTreeMap<String, ConfigRecord>,
    /// Profile id -> content root the recorded files were written under
    #[serde(default, rename = "contentRoots", skip_serializing_if = "BTreeMap::is_empty")]
    pub content_roots: BTreeMap<String, String>,
}

impl Default for TrackedManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            packages: BTreeMap::new(),
            config: BTreeMap::new(),
            content_roots: BTreeMap::new(),
        }
    }
}

impl TrackedManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when neither section records anything.
    pub fn is_empty(&self) -> bool {
        self.packages.values().all(PackageRecord::is_empty) && self.config.is_empty()
    }

    /// Package owning `path` in `profile`, if any.
    pub fn owner_of(&self, profile: &str, path: &str) -> Option<&str> {
        self.packages.iter().find_map(|(package, record)| {
            record
                .files
                .get(profile)
                .filter(|paths| paths.contains(path))
                .map(|_| package.as_str())
        })
    }

    /// Every recorded file, for any package and profile.
    pub fn all_files(&self) -> BTreeSet<&str> {
        self.packages
            .values()
            .flat_map(PackageRecord::all_files)
            .collect()
    }

    /// Profile ids that appear in the packages section.
    pub fn content_profiles(&self) -> BTreeSet<&str> {
        self.packages
            .values()
            .flat_map(|record| record.files.keys().map(String::as_str))
            .collect()
    }

    /// Drop empty file lists and packages that no longer own anything.
    pub fn compact(&mut self) {
        for record in self.packages.values_mut() {
            record.files.retain(|_, paths| !paths.is_empty());
        }
        self.packages.retain(|_, record| !record.files.is_empty());
        let profiles: BTreeSet<String> =
            self.content_profiles().into_iter().map(str::to_string).collect();
        self.content_roots.retain(|id, _| profiles.contains(id));
    }

    /// Content root recorded for `profile_id`, if any.
    pub fn content_root(&self, profile_id: &str) -> Option<&str> {
        self.content_roots.get(profile_id).map(String::as_str)
    }

    /// Rewrite recorded paths as project-relative.
    ///
    /// Absolute paths inside `root` are made relative. Paths outside the
    /// project, or climbing out of it with `..`, are dropped and returned
    /// so the caller can warn about them.
    fn relativize(&mut self, root: &NormalizedPath) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut fix = |raw: &str| -> Option<String> {
            let path = NormalizedPath::new(raw);
            if path.segments().any(|s| s == "..") {
                dropped.push(raw.to_string());
                return None;
            }
            if !path.is_absolute() {
                return Some(path.as_str().to_string());
            }
            match path.relative_to(root) {
                Some(rel) => Some(rel.as_str().to_string()),
                None => {
                    dropped.push(raw.to_string());
                    None
                }
            }
        };

        for record in self.packages.values_mut() {
            for paths in record.files.values_mut() {
                *paths = paths.iter().filter_map(|p| fix(p)).collect();
            }
        }
        self.content_roots.retain(|_, content_root| match fix(content_root) {
            Some(rel) => {
                *content_root = rel;
                true
            }
            None => false,
        });
        self.config.retain(|_, record| match fix(&record.path) {
            Some(rel) => {
                record.path = rel;
                true
            }
            None => false,
        });
        self.compact();
        dropped
    }
}

/// Resolve a recorded project-relative path against the project root.
pub fn resolve(root: &NormalizedPath, recorded: &str) -> NormalizedPath {
    root.join(recorded)
}

/// Derived per-package legacy manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyPackageManifest {
    pub package: String,
    /// Files across all profiles, without profile distinction
    pub files: BTreeSet<String>,
}

/// Result of loading the manifest.
#[derive(Debug, Default)]
pub struct LoadedManifest {
    pub manifest: TrackedManifest,
    /// Problems that were tolerated while loading
    pub warnings: Vec<String>,
}

/// Loads and saves the tracked manifest of one project.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: NormalizedPath,
    legacy_view: bool,
    store: ConfigStore,
}

impl ManifestStore {
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            root,
            legacy_view: false,
            store: ConfigStore::new(),
        }
    }

    /// Also emit the per-package legacy view on every save.
    pub fn with_legacy_view(mut self, enabled: bool) -> Self {
        self.legacy_view = enabled;
        self
    }

    /// Absolute path of the manifest file.
    pub fn path(&self) -> NormalizedPath {
        self.root.join(ProjectPath::Manifest.as_str())
    }

    fn legacy_dir(&self) -> NormalizedPath {
        self.root.join(ProjectPath::LegacyPackagesDir.as_str())
    }

    /// Load the manifest.
    ///
    /// A missing manifest is an empty one. A corrupt manifest is also
    /// treated as empty, with a warning. Only I/O failures are errors.
    pub fn load(&self) -> Result<LoadedManifest> {
        let path = self.path();
        let Some(content) = io::read_text_optional(&path)? else {
            return Ok(LoadedManifest::default());
        };

        let mut manifest: TrackedManifest = match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                let warning = format!("Ignoring unreadable manifest {path}: {e}");
                tracing::warn!("{warning}");
                return Ok(LoadedManifest {
                    manifest: TrackedManifest::new(),
                    warnings: vec![warning],
                });
            }
        };

        if manifest.version > MANIFEST_VERSION {
            tracing::warn!(
                version = manifest.version,
                "Manifest was written by a newer version"
            );
        }
        manifest.version = MANIFEST_VERSION;

        let warnings = manifest
            .relativize(&self.root)
            .into_iter()
            .map(|p| format!("Ignoring manifest path outside the project: {p}"))
            .collect();

        Ok(LoadedManifest { manifest, warnings })
    }

    /// Persist the manifest, deleting it once it records nothing.
    ///
    /// Returns `true` if anything on disk changed.
    pub fn save(&self, manifest: &TrackedManifest) -> Result<bool> {
        let mut manifest = manifest.clone();
        manifest.compact();

        if manifest.is_empty() {
            return self.delete();
        }

        let mut changed = self.store.save(&self.path(), &manifest)?;
        if self.legacy_view {
            changed |= self.write_legacy_view(&manifest)?;
        }
        Ok(changed)
    }

    fn delete(&self) -> Result<bool> {
        let mut changed = io::remove_file_if_exists(&self.path())?;
        changed |= self.clear_legacy_view(&BTreeSet::new())?;
        let state_dir = self.root.join(ProjectPath::StateDir.as_str());
        io::prune_empty_dirs(&self.legacy_dir(), &state_dir)?;
        changed |= io::remove_dir_if_empty(&state_dir)?;
        if changed {
            tracing::info!("Removed empty manifest");
        }
        Ok(changed)
    }

    fn write_legacy_view(&self, manifest: &TrackedManifest) -> Result<bool> {
        let dir = self.legacy_dir();
        let mut changed = false;
        let mut current = BTreeSet::new();

        for (package, file_name) in legacy_file_names(manifest.packages.keys()) {
            let record = &manifest.packages[package];
            let view = LegacyPackageManifest {
                package: package.to_string(),
                files: record.all_files().into_iter().map(str::to_string).collect(),
            };
            changed |= self.store.save(&dir.join(&file_name), &view)?;
            current.insert(file_name);
        }

        changed |= self.clear_legacy_view(&current)?;
        Ok(changed)
    }

    /// Remove legacy view files not named in `keep`.
    fn clear_legacy_view(&self, keep: &BTreeSet<String>) -> Result<bool> {
        let dir = self.legacy_dir();
        if !dir.is_dir() {
            return Ok(false);
        }
        let mut changed = false;
        for file in io::list_files(&dir.to_native())? {
            let file = NormalizedPath::new(file);
            let stale = file.extension() == Some("json")
                && file.file_name().is_some_and(|name| !keep.contains(name));
            if stale {
                changed |= io::remove_file_if_exists(&file)?;
            }
        }
        Ok(changed)
    }
}

/// Legacy view file names for `packages`, one distinct name per package.
///
/// A package whose id is already a plain name keeps it; others that
/// sanitize onto a taken name get a numeric suffix (`acme-tools-2.json`).
pub fn legacy_file_names<'p>(
    packages: impl IntoIterator<Item = &'p String>,
) -> BTreeMap<&'p str, String> {
    let packages: Vec<&str> = packages.into_iter().map(String::as_str).collect();
    let mut names: BTreeMap<&str, String> = BTreeMap::new();
    let mut taken: BTreeSet<String> = BTreeSet::new();

    let (plain, renamed): (Vec<&str>, Vec<&str>) = packages
        .into_iter()
        .partition(|p| legacy_file_name(p) == format!("{p}.json"));
    for package in plain {
        let name = legacy_file_name(package);
        taken.insert(name.clone());
        names.insert(package, name);
    }
    for package in renamed {
        let base = legacy_file_name(package);
        let stem = base.trim_end_matches(".json").to_string();
        let mut name = base;
        let mut n = 2;
        while taken.contains(&name) {
            name = format!("{stem}-{n}.json");
            n += 1;
        }
        taken.insert(name.clone());
        names.insert(package, name);
    }
    names
}

/// Sanitized legacy view name: `@scope/pkg` -> `scope-pkg.json`.
pub fn legacy_file_name(package: &str) -> String {
    let sanitized: String = package
        .trim_start_matches('@')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{sanitized}.json")
}
