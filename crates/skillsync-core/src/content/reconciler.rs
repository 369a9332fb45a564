//! Manifest-driven content reconciliation

use super::ignore::refresh_ignore_hints;
use super::plan::{ContentPlan, PlannedFile};
use crate::manifest::{PackageRecord, TrackedManifest, resolve};
use crate::report::OperationReport;
use crate::{Error, Result};
use skillsync_fs::{NormalizedPath, io};
use skillsync_profiles::{Profile, ProfileRegistry};
use std::collections::{BTreeMap, BTreeSet};

/// Package id -> profile id -> project-relative destinations
type Ownership = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Copies planned content into profile content roots and removes what
/// the manifest says is no longer wanted.
pub struct ContentReconciler<'a> {
    root: &'a NormalizedPath,
    registry: &'a ProfileRegistry,
}

impl<'a> ContentReconciler<'a> {
    pub fn new(root: &'a NormalizedPath, registry: &'a ProfileRegistry) -> Self {
        Self { root, registry }
    }

    /// Bring content for `profiles` in line with `plan`.
    ///
    /// Steps, in order:
    ///
    /// 1. Conflict pre-flight. Any collision aborts before anything is
    ///    touched.
    /// 2. Remove recorded files that the plan no longer writes for the same
    ///    package and profile. Retired packages lose everything. Paths the
    ///    plan assigns to any package are left in place.
    /// 3. Copy every planned file, overwriting unconditionally.
    /// 4. Rewrite the manifest packages section, refresh ignore hints and
    ///    prune directories left empty.
    ///
    /// Failed removals are warnings. Failed copies fail the report but do
    /// not stop the pass.
    pub fn apply(
        &self,
        profiles: &[Profile],
        plan: &ContentPlan,
        manifest: &mut TrackedManifest,
        report: &mut OperationReport,
    ) -> Result<()> {
        let conflicts = plan.conflicts(profiles);
        if !conflicts.is_empty() {
            return Err(Error::ContentConflict { conflicts });
        }

        let (mut desired, writes) = desired_ownership(profiles, plan);
        let claimed: BTreeSet<String> = desired
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
            .cloned()
            .collect();
        let previously_owned: BTreeSet<String> =
            manifest.all_files().into_iter().map(str::to_string).collect();

        // Old roots are refreshed too, so a moved root loses its hints
        let mut hint_roots = self.recorded_roots(manifest);
        for profile in profiles {
            hint_roots
                .entry(profile.id.clone())
                .or_default()
                .insert(content_root_of(profile));
        }

        let mut emptied = BTreeSet::new();
        let mut removed = 0usize;
        for (package, record) in &manifest.packages {
            let keep = desired.get(package);
            for (profile_id, paths) in &record.files {
                let kept = keep.and_then(|k| k.get(profile_id));
                for path in paths {
                    if kept.is_some_and(|k| k.contains(path)) || claimed.contains(path) {
                        continue;
                    }
                    removed += usize::from(self.remove_recorded(path, report, &mut emptied));
                }
            }
            if !plan.packages.contains(package) {
                report.action(format!("Retired package {package}"));
            }
        }

        let mut written = 0usize;
        for (profile_id, file, destination) in writes {
            let target = resolve(self.root, &destination);
            if target.exists() && !previously_owned.contains(&destination) {
                report.warn(format!(
                    "Overwriting unmanaged file {destination} for {}",
                    file.package_id
                ));
            }
            match io::copy_file(&file.source.to_native(), &target) {
                Ok(()) => {
                    written += 1;
                    tracing::debug!(source = %file.source, dest = %destination, "Copied");
                }
                Err(e) => {
                    report.fail(format!("Failed to write {destination}: {e}"));
                    if !target.exists() {
                        if let Some(paths) = desired
                            .get_mut(&file.package_id)
                            .and_then(|m| m.get_mut(profile_id))
                        {
                            paths.remove(&destination);
                        }
                    }
                }
            }
        }
        if written > 0 {
            report.action(format!("Wrote {written} content file(s)"));
        }

        manifest.packages = desired
            .into_iter()
            .map(|(package, files)| (package, PackageRecord { files }))
            .collect();
        manifest.content_roots = profiles
            .iter()
            .map(|p| (p.id.clone(), content_root_of(p)))
            .collect();
        manifest.compact();

        self.finish(&hint_roots, manifest, emptied, report);
        tracing::info!(written, removed, "Content reconciled");
        Ok(())
    }

    /// Remove every recorded file and empty the packages section.
    ///
    /// Profiles are taken from the manifest, not re-resolved.
    pub fn undo(&self, manifest: &mut TrackedManifest, report: &mut OperationReport) {
        let hint_roots = self.recorded_roots(manifest);

        let mut emptied = BTreeSet::new();
        let mut removed = 0usize;
        for (package, record) in &manifest.packages {
            for path in record.all_files() {
                removed += usize::from(self.remove_recorded(path, report, &mut emptied));
            }
            report.action(format!("Retired package {package}"));
        }
        manifest.packages.clear();
        manifest.content_roots.clear();

        self.finish(&hint_roots, manifest, emptied, report);
        tracing::info!(removed, "Content removed");
    }

    /// Delete one recorded file. Returns `true` if a file was removed.
    fn remove_recorded(
        &self,
        recorded: &str,
        report: &mut OperationReport,
        emptied: &mut BTreeSet<NormalizedPath>,
    ) -> bool {
        let path = resolve(self.root, recorded);
        let removed = match io::remove_file_if_exists(&path) {
            Ok(true) => {
                report.action(format!("Removed {recorded}"));
                true
            }
            Ok(false) => {
                tracing::debug!(path = %recorded, "Already gone");
                false
            }
            Err(e) => {
                report.warn(format!("Could not remove {recorded}: {e}"));
                false
            }
        };
        if let Some(parent) = path.parent() {
            emptied.insert(parent);
        }
        removed
    }

    /// Content roots of every profile with recorded files. Manifests
    /// without recorded roots fall back to the registry.
    fn recorded_roots(&self, manifest: &TrackedManifest) -> BTreeMap<String, BTreeSet<String>> {
        manifest
            .content_profiles()
            .into_iter()
            .map(|id| {
                let content_root = match manifest.content_root(id) {
                    Some(recorded) => recorded.to_string(),
                    None => content_root_of(&self.registry.profile(id)),
                };
                (id.to_string(), BTreeSet::from([content_root]))
            })
            .collect()
    }

    /// Refresh ignore hints in every given content root, then prune
    /// directories that became empty.
    fn finish(
        &self,
        hint_roots: &BTreeMap<String, BTreeSet<String>>,
        manifest: &TrackedManifest,
        mut emptied: BTreeSet<NormalizedPath>,
        report: &mut OperationReport,
    ) {
        for (profile_id, roots) in hint_roots {
            for content_root in roots {
                let content_root = NormalizedPath::new(content_root);
                let dir = resolve(self.root, content_root.as_str());
                // Roots a profile moved away from keep no hints
                let entries = if manifest.content_root(profile_id) == Some(content_root.as_str()) {
                    hint_entries(manifest, profile_id, &content_root)
                } else {
                    BTreeMap::new()
                };
                if entries.is_empty() && !dir.exists() {
                    continue;
                }
                match refresh_ignore_hints(&dir, &entries) {
                    Ok(true) => report.action(format!("Updated ignore hints in {content_root}")),
                    Ok(false) => {}
                    Err(e) => report.warn(format!(
                        "Could not update ignore hints in {content_root}: {e}"
                    )),
                }
                if entries.is_empty() {
                    emptied.insert(dir);
                }
            }
        }

        // Deepest first so nested directories go before their parents
        for dir in emptied.iter().rev() {
            match io::prune_empty_dirs(dir, self.root) {
                Ok(pruned) => {
                    for pruned in pruned {
                        if let Some(rel) = pruned.relative_to(self.root) {
                            report.action(format!("Removed empty directory {rel}"));
                        }
                    }
                }
                Err(e) => report.warn(format!("Could not prune {dir}: {e}")),
            }
        }
    }
}

/// Ownership the plan produces, plus the copies to perform.
fn desired_ownership<'p>(
    profiles: &'p [Profile],
    plan: &'p ContentPlan,
) -> (Ownership, Vec<(&'p str, &'p PlannedFile, String)>) {
    let mut desired = Ownership::new();
    let mut writes = Vec::new();
    for profile in profiles {
        for file in &plan.files {
            let destination = ContentPlan::destination(profile, file);
            desired
                .entry(file.package_id.clone())
                .or_default()
                .entry(profile.id.clone())
                .or_default()
                .insert(destination.clone());
            writes.push((profile.id.as_str(), file, destination));
        }
    }
    (desired, writes)
}

fn content_root_of(profile: &Profile) -> String {
    NormalizedPath::new(&profile.content_root).as_str().to_string()
}

/// Package -> paths relative to `content_root`, for one profile.
fn hint_entries(
    manifest: &TrackedManifest,
    profile_id: &str,
    content_root: &NormalizedPath,
) -> BTreeMap<String, BTreeSet<String>> {
    manifest
        .packages
        .iter()
        .filter_map(|(package, record)| {
            let paths: BTreeSet<String> = record
                .files
                .get(profile_id)?
                .iter()
                .filter_map(|p| NormalizedPath::new(p).relative_to(content_root))
                .map(|p| p.as_str().to_string())
                .collect();
            (!paths.is_empty()).then(|| (package.clone(), paths))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PrefixPolicy;
    use crate::desired::ContentItem;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        root: NormalizedPath,
        registry: ProfileRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = NormalizedPath::new(temp.path());
            Self {
                temp,
                root,
                registry: ProfileRegistry::with_builtins(),
            }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn exists(&self, rel: &str) -> bool {
            self.temp.path().join(rel).exists()
        }

        fn apply(
            &self,
            profiles: &[&str],
            items: &[ContentItem],
            manifest: &mut TrackedManifest,
        ) -> (Result<()>, OperationReport) {
            let profiles: Vec<Profile> = profiles.iter().map(|id| self.registry.profile(id)).collect();
            let plan = ContentPlan::build(&self.root, items, &PrefixPolicy::default());
            let mut report = OperationReport::new("apply-content");
            let reconciler = ContentReconciler::new(&self.root, &self.registry);
            let result = reconciler.apply(&profiles, &plan, manifest, &mut report);
            (result, report)
        }
    }

    #[test]
    fn copies_into_each_profile_and_records() {
        let fx = Fixture::new();
        fx.write("pkg/skills/a.md", "A");
        let mut manifest = TrackedManifest::new();

        let (result, report) = fx.apply(
            &["claude", "cursor"],
            &[ContentItem::new("pkg", "pkg/skills", "pkg/skills/a.md")],
            &mut manifest,
        );
        result.unwrap();
        assert!(report.success);

        assert!(fx.exists(".claude/skills/a.md"));
        assert!(fx.exists(".cursor/rules/a.md"));
        let files = &manifest.packages["pkg"].files;
        assert_eq!(files["claude"].iter().collect::<Vec<_>>(), vec![".claude/skills/a.md"]);
        assert_eq!(files["cursor"].iter().collect::<Vec<_>>(), vec![".cursor/rules/a.md"]);
    }

    #[test]
    fn conflict_writes_nothing() {
        let fx = Fixture::new();
        fx.write("p1/skill.md", "1");
        fx.write("p2/skill.md", "2");
        let mut manifest = TrackedManifest::new();

        let (result, _) = fx.apply(
            &["claude"],
            &[
                ContentItem::new("p1", "p1", "p1/skill.md"),
                ContentItem::new("p2", "p2", "p2/skill.md"),
            ],
            &mut manifest,
        );

        let Err(Error::ContentConflict { conflicts }) = result else {
            panic!("expected conflict");
        };
        assert_eq!(conflicts[0].packages, vec!["p1", "p2"]);
        assert!(!fx.exists(".claude/skills/skill.md"));
        assert!(manifest.is_empty());
    }

    #[test]
    fn dropped_item_is_pruned_with_empty_dirs() {
        let fx = Fixture::new();
        fx.write("pkg/a/SKILL.md", "A");
        fx.write("pkg/b/SKILL.md", "B");
        let mut manifest = TrackedManifest::new();
        let both = [
            ContentItem::new("pkg", "pkg", "pkg/a/SKILL.md"),
            ContentItem::new("pkg", "pkg", "pkg/b/SKILL.md"),
        ];
        fx.apply(&["claude"], &both, &mut manifest).0.unwrap();

        fx.apply(&["claude"], &both[..1], &mut manifest).0.unwrap();

        assert!(fx.exists(".claude/skills/a/SKILL.md"));
        assert!(!fx.exists(".claude/skills/b"));
    }

    #[test]
    fn deactivated_profile_loses_content() {
        let fx = Fixture::new();
        fx.write("pkg/a.md", "A");
        let items = [ContentItem::new("pkg", "pkg", "pkg/a.md")];
        let mut manifest = TrackedManifest::new();
        fx.apply(&["claude", "gemini"], &items, &mut manifest).0.unwrap();

        fx.apply(&["claude"], &items, &mut manifest).0.unwrap();

        assert!(fx.exists(".claude/skills/a.md"));
        assert!(!fx.exists(".gemini"));
        assert!(!manifest.packages["pkg"].files.contains_key("gemini"));
    }

    #[test]
    fn path_moving_between_packages_is_not_deleted() {
        let fx = Fixture::new();
        fx.write("p1/skill.md", "1");
        fx.write("p2/skill.md", "2");
        let mut manifest = TrackedManifest::new();
        fx.apply(&["claude"], &[ContentItem::new("p1", "p1", "p1/skill.md")], &mut manifest)
            .0
            .unwrap();

        let (result, report) = fx.apply(
            &["claude"],
            &[ContentItem::new("p2", "p2", "p2/skill.md")],
            &mut manifest,
        );
        result.unwrap();

        assert_eq!(fs::read_to_string(fx.temp.path().join(".claude/skills/skill.md")).unwrap(), "2");
        assert_eq!(manifest.owner_of("claude", ".claude/skills/skill.md"), Some("p2"));
        assert!(!report.has_warnings());
    }

    #[test]
    fn unmanaged_overwrite_warns() {
        let fx = Fixture::new();
        fx.write("pkg/a.md", "A");
        fx.write(".claude/skills/a.md", "user");
        let mut manifest = TrackedManifest::new();

        let (result, report) =
            fx.apply(&["claude"], &[ContentItem::new("pkg", "pkg", "pkg/a.md")], &mut manifest);
        result.unwrap();

        assert!(report.success);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(fs::read_to_string(fx.temp.path().join(".claude/skills/a.md")).unwrap(), "A");
    }

    #[test]
    fn ignore_hints_follow_manifest() {
        let fx = Fixture::new();
        fx.write("pkg/a.md", "A");
        let mut manifest = TrackedManifest::new();
        fx.apply(&["claude"], &[ContentItem::new("pkg", "pkg", "pkg/a.md")], &mut manifest)
            .0
            .unwrap();

        let hints = fs::read_to_string(fx.temp.path().join(".claude/skills/.gitignore")).unwrap();
        assert!(hints.contains("# skillsync:begin pkg\n/a.md\n# skillsync:end pkg"));

        let reconciler = ContentReconciler::new(&fx.root, &fx.registry);
        let mut report = OperationReport::new("undo-content");
        reconciler.undo(&mut manifest, &mut report);

        assert!(!fx.exists(".claude"));
        assert!(manifest.packages.is_empty());
    }

    #[test]
    fn undo_keeps_user_files() {
        let fx = Fixture::new();
        fx.write("pkg/a.md", "A");
        fx.write(".claude/skills/mine.md", "user");
        let mut manifest = TrackedManifest::new();
        fx.apply(&["claude"], &[ContentItem::new("pkg", "pkg", "pkg/a.md")], &mut manifest)
            .0
            .unwrap();

        let mut report = OperationReport::new("undo-content");
        ContentReconciler::new(&fx.root, &fx.registry).undo(&mut manifest, &mut report);

        assert!(!fx.exists(".claude/skills/a.md"));
        assert!(fx.exists(".claude/skills/mine.md"));
        assert!(!fx.exists(".claude/skills/.gitignore"));
    }

    #[test]
    fn moving_into_a_nested_root_drops_the_outer_hints() {
        let mut fx = Fixture::new();
        fx.write("pkg/a.md", "A");
        let items = [ContentItem::new("pkg", "pkg", "pkg/a.md")];
        let mut manifest = TrackedManifest::new();
        let mut outer = Profile::conventional("tool");
        outer.content_root = ".tool".to_string();
        fx.registry.register(outer).unwrap();
        fx.apply(&["tool"], &items, &mut manifest).0.unwrap();
        assert!(fx.exists(".tool/.gitignore"));

        fx.registry.register(Profile::conventional("tool")).unwrap();
        fx.apply(&["tool"], &items, &mut manifest).0.unwrap();

        assert!(!fx.exists(".tool/.gitignore"));
        assert!(!fx.exists(".tool/a.md"));
        assert!(fx.exists(".tool/skills/a.md"));
        assert!(fx.exists(".tool/skills/.gitignore"));
        assert_eq!(manifest.content_root("tool"), Some(".tool/skills"));
    }
}

