//! Active profile selection
//!
//! The active set for a run comes from exactly one of three sources, in
//! priority order: an explicit list, marker detection, a default list.
//! Sources are never merged.

use crate::registry::ProfileRegistry;
use crate::types::validate_profile_id;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Keyword selecting no profiles at all.
const NONE_KEYWORD: &str = "none";

/// Which source produced the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Explicit,
    Detected,
    Default,
    /// Every source was empty
    Empty,
}

impl SelectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Detected => "detected",
            Self::Default => "default",
            Self::Empty => "empty",
        }
    }
}

/// Result of profile resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProfiles {
    /// Lowercase ids, deduplicated, in priority order
    pub ids: Vec<String>,
    pub source: SelectionSource,
    /// Ids dropped because they were not usable
    pub warnings: Vec<String>,
}

impl ResolvedProfiles {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Parse a user-supplied profile list.
///
/// Entries are separated by commas or whitespace, compared
/// case-insensitively and deduplicated keeping first occurrence. The
/// keyword `none` (or an empty string) yields the empty list.
///
/// # Example
/// ```
/// use skillsync_profiles::parse_profile_list;
///
/// assert_eq!(parse_profile_list("Claude, cursor claude"), vec!["claude", "cursor"]);
/// assert!(parse_profile_list("none").is_empty());
/// ```
pub fn parse_profile_list(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for token in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let id = token.trim().to_lowercase();
        if id.is_empty() || id == NONE_KEYWORD || ids.contains(&id) {
            continue;
        }
        ids.push(id);
    }
    ids
}

/// Chooses the active profiles for a project.
pub struct ProfileResolver<'a> {
    registry: &'a ProfileRegistry,
    root: PathBuf,
}

impl<'a> ProfileResolver<'a> {
    /// Create a resolver detecting markers under `root`.
    pub fn new(registry: &'a ProfileRegistry, root: impl AsRef<Path>) -> Self {
        Self {
            registry,
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve the active profile set.
    ///
    /// - `explicit`: `Some` wins outright, even when it parses to nothing
    ///   (`""` or `"none"` select no profiles).
    /// - `auto_detect`: registered profiles whose marker exists, in
    ///   registry order.
    /// - `defaults`: used when detection is off or found nothing.
    ///
    /// No hardcoded fallback is invented when every source is empty.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        auto_detect: bool,
        defaults: &[String],
    ) -> ResolvedProfiles {
        if let Some(raw) = explicit {
            return Self::finish(parse_profile_list(raw), SelectionSource::Explicit);
        }

        if auto_detect {
            let detected: Vec<String> = self
                .registry
                .detect(&self.root)
                .into_iter()
                .map(|p| p.id.clone())
                .collect();
            if !detected.is_empty() {
                tracing::debug!(profiles = ?detected, "Detected profiles from markers");
                return Self::finish(detected, SelectionSource::Detected);
            }
        }

        let defaults = parse_profile_list(&defaults.join(","));
        if defaults.is_empty() {
            return Self::finish(Vec::new(), SelectionSource::Empty);
        }
        Self::finish(defaults, SelectionSource::Default)
    }

    fn finish(candidates: Vec<String>, source: SelectionSource) -> ResolvedProfiles {
        let mut ids = Vec::with_capacity(candidates.len());
        let mut warnings = Vec::new();
        for id in candidates {
            match validate_profile_id(&id) {
                Ok(()) => ids.push(id),
                Err(e) => {
                    tracing::warn!("Ignoring profile: {e}");
                    warnings.push(e.to_string());
                }
            }
        }
        ResolvedProfiles {
            ids,
            source,
            warnings,
        }
    }
}
