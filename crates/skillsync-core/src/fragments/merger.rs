//! Merging fragments into shared configuration documents
//!
//! Per profile and pass: read the document, drop the entries managed last
//! time, insert the transformed union of all fragments under the profile's
//! root key, then write only if the bytes changed. Top-level properties
//! other than the root key and unmanaged entries under it are carried
//! through untouched.

use super::document::{DocumentState, WriteOutcome, read_document, write_document};
use super::fragment::{ConfigFragment, union_entries};
use crate::Result;
use crate::manifest::{ConfigRecord, TrackedManifest, resolve};
use crate::report::OperationReport;
use serde_json::{Map, Value};
use skillsync_fs::NormalizedPath;
use skillsync_profiles::{Profile, ProfileRegistry};
use std::collections::{BTreeMap, BTreeSet};

/// Merges fragments into each profile's configuration document.
pub struct ConfigFragmentMerger<'a> {
    root: &'a NormalizedPath,
    registry: &'a ProfileRegistry,
}

impl<'a> ConfigFragmentMerger<'a> {
    pub fn new(root: &'a NormalizedPath, registry: &'a ProfileRegistry) -> Self {
        Self { root, registry }
    }

    /// Merge `fragments` into the document of every profile in `profiles`.
    ///
    /// Profiles recorded in the manifest but not active now are cleaned
    /// first. A profile whose recorded document path changed has its old
    /// document cleaned before the new one is merged.
    ///
    /// Several profiles may share one document. Keys managed by any record
    /// for a path count as managed for every profile writing that path, and
    /// a shared document is only stripped when no active profile writes it.
    pub fn merge(
        &self,
        profiles: &[Profile],
        fragments: &[ConfigFragment],
        manifest: &mut TrackedManifest,
        report: &mut OperationReport,
    ) -> Result<()> {
        let active_paths: BTreeSet<String> = profiles.iter().map(document_path).collect();
        let mut pass = DocumentPass {
            previous: managed_by_path(manifest),
            written: BTreeMap::new(),
        };

        let inactive: Vec<String> = manifest
            .config
            .keys()
            .filter(|id| !profiles.iter().any(|p| &p.id == *id))
            .cloned()
            .collect();
        for id in inactive {
            if let Some(record) = manifest.config.remove(&id) {
                if active_paths.contains(&record.path) {
                    tracing::debug!(profile = %id, path = %record.path, "Shared document re-owned");
                    continue;
                }
                let root_key = self.registry.profile(&id).root_key;
                self.strip(&id, &record, &root_key, report)?;
            }
        }

        let entries = union_entries(fragments);
        for profile in profiles {
            self.merge_profile(profile, &entries, &active_paths, &mut pass, manifest, report)?;
        }
        tracing::info!(
            profiles = profiles.len(),
            entries = entries.len(),
            "Configuration merged"
        );
        Ok(())
    }

    fn merge_profile(
        &self,
        profile: &Profile,
        entries: &BTreeMap<String, Value>,
        active_paths: &BTreeSet<String>,
        pass: &mut DocumentPass,
        manifest: &mut TrackedManifest,
        report: &mut OperationReport,
    ) -> Result<()> {
        let doc_rel = document_path(profile);
        let previous = manifest.config.get(&profile.id).cloned().unwrap_or_default();

        if !previous.path.is_empty() && previous.path != doc_rel {
            report.action(format!(
                "Moving {} entries from {} to {doc_rel}",
                profile.id, previous.path
            ));
            if !active_paths.contains(&previous.path) {
                self.strip(&profile.id, &previous, &profile.root_key, report)?;
            }
        }
        let previously_managed = pass.previous.get(&doc_rel).cloned().unwrap_or_default();
        let written_here = pass.written.entry(doc_rel.clone()).or_default();

        let path = resolve(self.root, &doc_rel);
        let (mut document, unreadable) = match read_document(&path)? {
            DocumentState::Absent => (Map::new(), false),
            DocumentState::Parsed(document) => (document, false),
            DocumentState::Unreadable(reason) => {
                report.warn(format!("Treating unreadable {doc_rel} as empty: {reason}"));
                (Map::new(), true)
            }
        };

        let had_root = document.contains_key(&profile.root_key);
        let mut managed_root = match document.remove(&profile.root_key) {
            None => Map::new(),
            Some(Value::Object(existing)) => existing,
            Some(_) => {
                report.warn(format!(
                    "Skipping {}: '{}' in {doc_rel} is not an object",
                    profile.id, profile.root_key
                ));
                return Ok(());
            }
        };

        for name in &previously_managed {
            managed_root.remove(name);
        }
        for (name, entry) in entries {
            if managed_root.contains_key(name) && !written_here.contains(name) {
                report.warn(format!("Replacing unmanaged entry '{name}' in {doc_rel}"));
            }
            managed_root.insert(name.clone(), profile.transform.apply(entry));
        }
        written_here.extend(entries.keys().cloned());
        // An empty root key the user wrote is kept; one left empty by
        // removing managed entries is dropped.
        if !managed_root.is_empty() || (had_root && previously_managed.is_empty()) {
            document.insert(profile.root_key.clone(), Value::Object(managed_root));
        }

        if unreadable && document.is_empty() {
            tracing::debug!(path = %doc_rel, "Leaving unreadable document in place");
        } else {
            record_write(report, &doc_rel, write_document(&path, &document)?);
        }

        if entries.is_empty() {
            manifest.config.remove(&profile.id);
        } else {
            manifest.config.insert(
                profile.id.clone(),
                ConfigRecord {
                    path: doc_rel,
                    managed_keys: entries.keys().cloned().collect(),
                },
            );
        }
        Ok(())
    }

    /// Remove all managed entries recorded in the manifest and empty the
    /// config section. Cleanup is best effort: failures become warnings.
    pub fn clean(&self, manifest: &mut TrackedManifest, report: &mut OperationReport) {
        let records = std::mem::take(&mut manifest.config);
        for (id, record) in &records {
            let root_key = self.registry.profile(id).root_key;
            if let Err(e) = self.strip(id, record, &root_key, report) {
                report.warn(format!("Could not clean {}: {e}", record.path));
            }
        }
        tracing::info!(profiles = records.len(), "Configuration cleaned");
    }

    /// Remove `record`'s managed entries from its document.
    fn strip(
        &self,
        profile_id: &str,
        record: &ConfigRecord,
        root_key: &str,
        report: &mut OperationReport,
    ) -> Result<()> {
        let path = resolve(self.root, &record.path);
        let mut document = match read_document(&path)? {
            DocumentState::Absent => return Ok(()),
            DocumentState::Parsed(document) => document,
            DocumentState::Unreadable(reason) => {
                report.warn(format!("Cannot clean unreadable {}: {reason}", record.path));
                return Ok(());
            }
        };

        let now_empty = match document.get_mut(root_key) {
            None => return Ok(()),
            Some(Value::Object(entries)) => {
                let before = entries.len();
                entries.retain(|name, _| !record.managed_keys.contains(name));
                if entries.len() == before {
                    return Ok(());
                }
                entries.is_empty()
            }
            Some(_) => {
                report.warn(format!(
                    "Cannot clean {}: '{root_key}' in {} is not an object",
                    profile_id, record.path
                ));
                return Ok(());
            }
        };
        if now_empty {
            document.remove(root_key);
        }

        record_write(report, &record.path, write_document(&path, &document)?);
        Ok(())
    }

    /// Entry names currently managed for `profile_id`.
    pub fn managed_keys<'m>(manifest: &'m TrackedManifest, profile_id: &str) -> BTreeSet<&'m str> {
        manifest
            .config
            .get(profile_id)
            .map(|r| r.managed_keys.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Managed keys per document for one merge pass.
struct DocumentPass {
    /// Keys recorded by any profile for each path before this pass
    previous: BTreeMap<String, BTreeSet<String>>,
    /// Keys written so far in this pass, per path
    written: BTreeMap<String, BTreeSet<String>>,
}

fn document_path(profile: &Profile) -> String {
    NormalizedPath::new(&profile.config_path).as_str().to_string()
}

/// Union of recorded managed keys, grouped by document path.
fn managed_by_path(manifest: &TrackedManifest) -> BTreeMap<String, BTreeSet<String>> {
    let mut by_path: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in manifest.config.values() {
        by_path
            .entry(record.path.clone())
            .or_default()
            .extend(record.managed_keys.iter().cloned());
    }
    by_path
}

fn record_write(report: &mut OperationReport, doc_rel: &str, outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Written => report.action(format!("Updated {doc_rel}")),
        WriteOutcome::Deleted => report.action(format!("Removed empty {doc_rel}")),
        WriteOutcome::Unchanged => tracing::debug!(path = %doc_rel, "Document unchanged"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
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

        fn merge(
            &self,
            profiles: &[&str],
            fragments: &[ConfigFragment],
            manifest: &mut TrackedManifest,
        ) -> OperationReport {
            let profiles: Vec<Profile> = profiles.iter().map(|id| self.registry.profile(id)).collect();
            let mut report = OperationReport::new("apply-config");
            ConfigFragmentMerger::new(&self.root, &self.registry)
                .merge(&profiles, fragments, manifest, &mut report)
                .unwrap();
            report
        }

        fn read(&self, rel: &str) -> Value {
            serde_json::from_str(&fs::read_to_string(self.temp.path().join(rel)).unwrap()).unwrap()
        }

        fn write(&self, rel: &str, value: Value) {
            let path = self.temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, value.to_string()).unwrap();
        }
    }

    fn fragment(package: &str, entries: Value) -> ConfigFragment {
        ConfigFragment::from_document(package, &json!({ "mcpServers": entries })).unwrap()
    }

    #[test]
    fn merge_preserves_user_entries_and_extra_properties() {
        let fx = Fixture::new();
        fx.write(
            ".mcp.json",
            json!({"mcpServers": {"my-server": {"command": "mine"}}, "inputs": [1]}),
        );
        let mut manifest = TrackedManifest::new();

        fx.merge(&["claude"], &[fragment("pkg", json!({"alpha": {"command": "run"}}))], &mut manifest);

        assert_eq!(
            fx.read(".mcp.json"),
            json!({
                "inputs": [1],
                "mcpServers": {"alpha": {"command": "run"}, "my-server": {"command": "mine"}}
            })
        );
        assert_eq!(
            ConfigFragmentMerger::managed_keys(&manifest, "claude"),
            BTreeSet::from(["alpha"])
        );
    }

    #[test]
    fn second_merge_does_not_rewrite() {
        let fx = Fixture::new();
        let fragments = [fragment("pkg", json!({"alpha": {"command": "run"}}))];
        let mut manifest = TrackedManifest::new();
        let first = fx.merge(&["claude"], &fragments, &mut manifest);
        let before = manifest.clone();

        let second = fx.merge(&["claude"], &fragments, &mut manifest);

        assert_eq!(first.actions.len(), 1);
        assert!(second.actions.is_empty());
        assert_eq!(manifest, before);
    }

    #[test]
    fn removed_fragment_entry_is_dropped_and_empty_document_deleted() {
        let fx = Fixture::new();
        let mut manifest = TrackedManifest::new();
        fx.merge(&["claude"], &[fragment("pkg", json!({"alpha": {}}))], &mut manifest);

        fx.merge(&["claude"], &[], &mut manifest);

        assert!(!fx.temp.path().join(".mcp.json").exists());
        assert!(manifest.config.is_empty());
    }

    #[test]
    fn profile_transform_is_applied() {
        let fx = Fixture::new();
        let mut manifest = TrackedManifest::new();
        fx.merge(
            &["opencode"],
            &[fragment("pkg", json!({"alpha": {"type": "stdio", "command": "run", "args": ["x"]}}))],
            &mut manifest,
        );

        assert_eq!(
            fx.read("opencode.json")["mcp"]["alpha"],
            json!({"type": "local", "command": ["run", "x"], "enabled": true})
        );
    }

    #[test]
    fn non_object_root_key_skips_profile() {
        let fx = Fixture::new();
        fx.write(".mcp.json", json!({"mcpServers": "disabled"}));
        let mut manifest = TrackedManifest::new();

        let report = fx.merge(&["claude"], &[fragment("pkg", json!({"alpha": {}}))], &mut manifest);

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(fx.read(".mcp.json"), json!({"mcpServers": "disabled"}));
        assert!(manifest.config.is_empty());
    }

    #[test]
    fn takeover_of_unmanaged_entry_warns() {
        let fx = Fixture::new();
        fx.write(".mcp.json", json!({"mcpServers": {"alpha": {"command": "old"}}}));
        let mut manifest = TrackedManifest::new();

        let report = fx.merge(&["claude"], &[fragment("pkg", json!({"alpha": {"command": "new"}}))], &mut manifest);

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(fx.read(".mcp.json")["mcpServers"]["alpha"]["command"], "new");
    }

    #[test]
    fn inactive_profile_is_cleaned() {
        let fx = Fixture::new();
        let fragments = [fragment("pkg", json!({"alpha": {}}))];
        let mut manifest = TrackedManifest::new();
        fx.merge(&["claude", "gemini"], &fragments, &mut manifest);
        assert!(fx.temp.path().join(".gemini/settings.json").exists());

        fx.merge(&["claude"], &fragments, &mut manifest);

        assert!(!fx.temp.path().join(".gemini/settings.json").exists());
        assert_eq!(manifest.config.keys().collect::<Vec<_>>(), vec!["claude"]);
    }

    #[test]
    fn clean_leaves_user_only_document() {
        let fx = Fixture::new();
        fx.write(".mcp.json", json!({"mcpServers": {"my-server": {"command": "mine"}}}));
        let mut manifest = TrackedManifest::new();
        fx.merge(&["claude"], &[fragment("pkg", json!({"alpha": {}}))], &mut manifest);

        let mut report = OperationReport::new("undo-config");
        ConfigFragmentMerger::new(&fx.root, &fx.registry).clean(&mut manifest, &mut report);

        assert_eq!(fx.read(".mcp.json"), json!({"mcpServers": {"my-server": {"command": "mine"}}}));
        assert!(manifest.config.is_empty());
    }

    #[test]
    fn unreadable_document_without_entries_is_left_alone() {
        let fx = Fixture::new();
        fs::write(fx.temp.path().join(".mcp.json"), "{ oops").unwrap();
        let mut manifest = TrackedManifest::new();

        let report = fx.merge(&["claude"], &[], &mut manifest);

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(fs::read_to_string(fx.temp.path().join(".mcp.json")).unwrap(), "{ oops");
    }

    fn share_claude_document(fx: &mut Fixture) {
        let mut windsurf = Profile::conventional("windsurf");
        windsurf.config_path = ".mcp.json".to_string();
        fx.registry.register(windsurf).unwrap();
    }

    #[test]
    fn shared_document_entries_are_not_seen_as_unmanaged() {
        let mut fx = Fixture::new();
        share_claude_document(&mut fx);
        let fragments = [fragment("pkg", json!({"alpha": {"command": "run"}}))];
        let mut manifest = TrackedManifest::new();

        let report = fx.merge(&["claude", "windsurf"], &fragments, &mut manifest);

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.actions.len(), 1);
        assert_eq!(fx.read(".mcp.json"), json!({"mcpServers": {"alpha": {"command": "run"}}}));
        assert_eq!(
            ConfigFragmentMerger::managed_keys(&manifest, "windsurf"),
            BTreeSet::from(["alpha"])
        );
    }

    #[test]
    fn dropping_one_sharer_keeps_the_document_in_place() {
        let mut fx = Fixture::new();
        share_claude_document(&mut fx);
        let fragments = [fragment("pkg", json!({"alpha": {"command": "run"}}))];
        let mut manifest = TrackedManifest::new();
        fx.merge(&["claude", "windsurf"], &fragments, &mut manifest);

        let report = fx.merge(&["windsurf"], &fragments, &mut manifest);

        assert!(report.actions.is_empty(), "{:?}", report.actions);
        assert!(report.warnings.is_empty());
        assert_eq!(fx.read(".mcp.json"), json!({"mcpServers": {"alpha": {"command": "run"}}}));
        assert_eq!(manifest.config.keys().collect::<Vec<_>>(), vec!["windsurf"]);
    }

    #[test]
    fn dropped_sharer_keys_are_removed_by_the_remaining_profile() {
        let mut fx = Fixture::new();
        share_claude_document(&mut fx);
        let mut manifest = TrackedManifest::new();
        fx.merge(
            &["claude", "windsurf"],
            &[fragment("pkg", json!({"alpha": {}, "beta": {}}))],
            &mut manifest,
        );

        fx.merge(&["windsurf"], &[fragment("pkg", json!({"alpha": {}}))], &mut manifest);

        assert_eq!(fx.read(".mcp.json"), json!({"mcpServers": {"alpha": {}}}));
    }
}

