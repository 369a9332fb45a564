//! Content planning and conflict pre-flight
//!
//! Planning is pure: it reads the filesystem only to check and expand
//! sources, and never writes. The conflict check runs on the plan before
//! any mutation.

use super::prefix::{PrefixPolicy, apply_prefix, resolve_prefix};
use crate::desired::{ContentItem, resolve_input};
use skillsync_fs::{NormalizedPath, io};
use skillsync_profiles::Profile;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One file to copy, independent of profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub package_id: String,
    /// Absolute source file
    pub source: NormalizedPath,
    /// Destination relative to a profile's content root
    pub relative: NormalizedPath,
}

/// The files a run should install.
#[derive(Debug, Clone, Default)]
pub struct ContentPlan {
    pub files: Vec<PlannedFile>,
    /// Every package id named by an item, including skipped items
    pub packages: BTreeSet<String>,
    /// Items skipped while planning
    pub warnings: Vec<String>,
}

impl ContentPlan {
    /// Build the plan for `items`.
    ///
    /// Disabled items, items without package or source root, and missing
    /// sources are skipped with a warning.
    pub fn build(root: &NormalizedPath, items: &[ContentItem], policy: &PrefixPolicy) -> Self {
        let mut plan = Self::default();
        for item in items {
            plan.add_item(root, item, policy);
        }
        plan
    }

    fn add_item(&mut self, root: &NormalizedPath, item: &ContentItem, policy: &PrefixPolicy) {
        let package_id = item
            .package_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(package_id) = package_id {
            self.packages.insert(package_id.to_string());
        }

        if !item.is_enabled() {
            tracing::debug!(source = %item.source_path, "Skipping disabled item");
            return;
        }
        let Some(package_id) = package_id else {
            self.warn(format!("Skipping {}: no package id", item.source_path));
            return;
        };
        let Some(source_root) = item.source_root.as_deref().filter(|r| !r.trim().is_empty())
        else {
            self.warn(format!("Skipping {}: no source root", item.source_path));
            return;
        };
        if item.source_path.trim().is_empty() {
            self.warn(format!("Skipping item of {package_id}: no source path"));
            return;
        }

        let source = resolve_input(root, &item.source_path);
        let source_root = resolve_input(root, source_root);
        let sources = if source.is_dir() {
            match io::list_files(&source.to_native()) {
                Ok(files) => files.into_iter().map(NormalizedPath::new).collect(),
                Err(e) => {
                    self.warn(format!("Skipping {source}: {e}"));
                    return;
                }
            }
        } else if source.is_file() {
            vec![source.clone()]
        } else {
            self.warn(format!("Skipping {source}: source does not exist"));
            return;
        };

        let prefix = resolve_prefix(item, policy);
        for file in sources {
            let Some(relative) = file.relative_to(&source_root) else {
                self.warn(format!("Skipping {file}: not inside source root {source_root}"));
                continue;
            };
            if relative.segments().any(|s| s == "..") {
                self.warn(format!("Skipping {file}: destination escapes the content root"));
                continue;
            }
            let relative = match &prefix {
                Some(prefix) => apply_prefix(&relative, prefix),
                None => relative,
            };
            self.files.push(PlannedFile {
                package_id: package_id.to_string(),
                source: file,
                relative,
            });
        }
    }

    fn warn(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Project-relative destination of `file` under `profile`.
    pub fn destination(profile: &Profile, file: &PlannedFile) -> String {
        NormalizedPath::new(&profile.content_root)
            .join(file.relative.as_str())
            .as_str()
            .to_string()
    }

    /// Find every destination claimed by more than one package.
    ///
    /// Collisions are checked per profile; two items of the same package
    /// at one destination are not a conflict.
    pub fn conflicts(&self, profiles: &[Profile]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for profile in profiles {
            let mut owners: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
            for file in &self.files {
                owners
                    .entry(Self::destination(profile, file))
                    .or_default()
                    .insert(&file.package_id);
            }
            conflicts.extend(owners.into_iter().filter(|(_, pkgs)| pkgs.len() > 1).map(
                |(destination, packages)| Conflict {
                    profile: profile.id.clone(),
                    destination,
                    packages: packages.into_iter().map(str::to_string).collect(),
                },
            ));
        }
        conflicts
    }
}

/// A destination claimed by several packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub profile: String,
    /// Project-relative destination
    pub destination: String,
    /// Claiming packages, sorted
    pub packages: Vec<String>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] is claimed by {}",
            self.destination,
            self.profile,
            self.packages.join(", ")
        )
    }
}
