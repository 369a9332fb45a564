//! Top-level operations
//!
//! [`SyncEngine`] ties the components together. Every operation returns
//! an [`OperationReport`]; internal errors are converted into a failed
//! report at this boundary and never escape as `Err`.
//!
//! The manifest is read once per operation, mutated in memory and written
//! once at the end. Undo works from the manifest alone and does not
//! re-resolve profiles.

use crate::content::{ContentPlan, ContentReconciler};
use crate::desired::{ContentItem, DesiredState, FragmentSource};
use crate::fragments::{ConfigFragment, ConfigFragmentMerger};
use crate::manifest::{ManifestStore, TrackedManifest};
use crate::report::OperationReport;
use crate::settings::{Settings, SettingsLoader};
use crate::Result;
use skillsync_fs::NormalizedPath;
use skillsync_profiles::{Profile, ProfileRegistry, ProfileResolver, ResolvedProfiles};

/// Reconciliation engine for one project.
pub struct SyncEngine {
    root: NormalizedPath,
    settings: Settings,
    registry: ProfileRegistry,
    manifests: ManifestStore,
}

impl SyncEngine {
    /// Create an engine using the registry described by `settings`.
    pub fn new(root: NormalizedPath, settings: Settings) -> Result<Self> {
        let registry = settings.registry()?;
        Ok(Self::with_registry(root, settings, registry))
    }

    /// Create an engine with an explicit registry.
    pub fn with_registry(root: NormalizedPath, settings: Settings, registry: ProfileRegistry) -> Self {
        let manifests = ManifestStore::new(root.clone()).with_legacy_view(settings.legacy_manifest);
        Self {
            root,
            settings,
            registry,
            manifests,
        }
    }

    /// Create an engine from the layered settings of `root`.
    pub fn load(root: NormalizedPath) -> Result<Self> {
        let settings = SettingsLoader::new(root.clone()).load()?;
        Self::new(root, settings)
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Resolve the active profiles from `explicit`, then detection, then
    /// the configured default list.
    pub fn resolve_profiles(&self, explicit: Option<&str>) -> ResolvedProfiles {
        ProfileResolver::new(&self.registry, self.root.to_native()).resolve(
            explicit,
            self.settings.auto_detect,
            &self.settings.profiles,
        )
    }

    /// Current manifest, for inspection.
    pub fn manifest(&self) -> Result<TrackedManifest> {
        Ok(self.manifests.load()?.manifest)
    }

    /// Install `items` into the content roots of `profile_ids`.
    pub fn apply_content(&self, profile_ids: &[String], items: &[ContentItem]) -> OperationReport {
        self.run("apply-content", |report| {
            let profiles = self.profiles(profile_ids, report);
            let mut manifest = self.load_manifest(report)?;
            let plan = ContentPlan::build(&self.root, items, &self.settings.prefix);
            report.warnings.extend(plan.warnings.iter().cloned());

            ContentReconciler::new(&self.root, &self.registry).apply(
                &profiles,
                &plan,
                &mut manifest,
                report,
            )?;
            self.save_manifest(&manifest, report)
        })
    }

    /// Merge `fragments` into the configuration documents of `profile_ids`.
    pub fn apply_config(&self, profile_ids: &[String], fragments: &[FragmentSource]) -> OperationReport {
        self.run("apply-config", |report| {
            let profiles = self.profiles(profile_ids, report);
            let mut manifest = self.load_manifest(report)?;
            let fragments: Vec<ConfigFragment> = fragments
                .iter()
                .filter_map(|source| match ConfigFragment::load(&self.root, source) {
                    Ok(fragment) => Some(fragment),
                    Err(warning) => {
                        report.warn(warning);
                        None
                    }
                })
                .collect();

            ConfigFragmentMerger::new(&self.root, &self.registry).merge(
                &profiles,
                &fragments,
                &mut manifest,
                report,
            )?;
            self.save_manifest(&manifest, report)
        })
    }

    /// Remove every content file recorded in the manifest.
    pub fn undo_content(&self) -> OperationReport {
        self.run("undo-content", |report| {
            let mut manifest = self.load_manifest(report)?;
            ContentReconciler::new(&self.root, &self.registry).undo(&mut manifest, report);
            self.save_manifest(&manifest, report)
        })
    }

    /// Remove every managed configuration entry recorded in the manifest.
    pub fn undo_config(&self) -> OperationReport {
        self.run("undo-config", |report| {
            let mut manifest = self.load_manifest(report)?;
            ConfigFragmentMerger::new(&self.root, &self.registry).clean(&mut manifest, report);
            self.save_manifest(&manifest, report)
        })
    }

    /// Content phase, then configuration phase.
    ///
    /// The configuration phase is skipped when the content phase failed.
    pub fn apply(&self, profile_ids: &[String], desired: &DesiredState) -> OperationReport {
        let mut report = OperationReport::new("apply");
        let content = self.apply_content(profile_ids, &desired.items);
        let content_failed = !content.success;
        report.absorb(content);

        if content_failed {
            report.warn("Skipping configuration merge: content phase failed");
        } else {
            report.absorb(self.apply_config(profile_ids, &desired.fragments));
        }
        report
    }

    /// Undo both phases.
    pub fn undo(&self) -> OperationReport {
        let mut report = OperationReport::new("undo");
        report.absorb(self.undo_content());
        report.absorb(self.undo_config());
        report
    }

    fn run(
        &self,
        operation: &str,
        body: impl FnOnce(&mut OperationReport) -> Result<()>,
    ) -> OperationReport {
        let mut report = OperationReport::new(operation);
        tracing::debug!(operation, root = %self.root, "Starting operation");
        if let Err(e) = body(&mut report) {
            report.fail(e.to_string());
        }
        report
    }

    /// Profiles for `ids`, dropping (with a warning) any that are unsafe.
    fn profiles(&self, ids: &[String], report: &mut OperationReport) -> Vec<Profile> {
        ids.iter()
            .map(|id| self.registry.profile(id))
            .filter(|profile| match profile.validate() {
                Ok(()) => true,
                Err(e) => {
                    report.warn(format!("Ignoring profile: {e}"));
                    false
                }
            })
            .collect()
    }

    fn load_manifest(&self, report: &mut OperationReport) -> Result<TrackedManifest> {
        let loaded = self.manifests.load()?;
        for warning in loaded.warnings {
            report.warn(warning);
        }
        Ok(loaded.manifest)
    }

    fn save_manifest(&self, manifest: &TrackedManifest, report: &mut OperationReport) -> Result<()> {
        if self.manifests.save(manifest)? {
            report.action("Updated manifest");
        }
        Ok(())
    }
}
