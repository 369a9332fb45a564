//! Profile registry storage

use crate::builtins::builtin_profiles;
use crate::error::Result;
use crate::types::{Profile, ProfileDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Ordered table of known profiles.
///
/// Registration order is the detection order. Lookups are case-insensitive.
/// Ids that are not registered still resolve, through
/// [`Profile::conventional`], so the registry never rejects a custom id.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
}

impl ProfileRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with all built-in profiles.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for profile in builtin_profiles() {
            registry.insert(profile);
        }
        registry
    }

    /// Register a profile after validating it.
    ///
    /// A profile with the same id is replaced in place, keeping its
    /// position in the detection order.
    pub fn register(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        self.insert(profile);
        Ok(())
    }

    fn insert(&mut self, mut profile: Profile) {
        profile.id = profile.id.trim().to_lowercase();
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Apply definitions from settings.
    ///
    /// Each definition overlays the registered profile of the same id, or
    /// the conventional layout for a new id. New ids are appended in key
    /// order.
    pub fn apply_definitions(&mut self, definitions: &BTreeMap<String, ProfileDefinition>) -> Result<()> {
        for (id, definition) in definitions {
            let base = self.profile(id);
            let profile = definition.clone().apply_to(base);
            tracing::debug!(profile = %profile.id, "Registering configured profile");
            self.register(profile)?;
        }
        Ok(())
    }

    /// Get a registered profile by id.
    pub fn get(&self, id: &str) -> Option<&Profile> {
        let id = id.trim().to_lowercase();
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Resolve any id to a profile, synthesizing the conventional layout
    /// for unregistered ids.
    pub fn profile(&self, id: &str) -> Profile {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| Profile::conventional(id))
    }

    /// Check if a profile is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of registered profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Registered ids, in registry order.
    pub fn ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }

    /// Iterate over registered profiles, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    /// Registered profiles whose marker exists under `root`, in registry order.
    pub fn detect(&self, root: &Path) -> Vec<&Profile> {
        self.profiles
            .iter()
            .filter(|p| root.join(&p.marker).exists())
            .collect()
    }
}
