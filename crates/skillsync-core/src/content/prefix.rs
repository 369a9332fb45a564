//! Destination prefix resolution
//!
//! Precedence, highest first:
//!
//! 1. explicit per-item `prefix` (empty means none)
//! 2. per-item `use_prefix` flag
//! 3. global `always` policy
//! 4. no prefix
//!
//! When 2 or 3 asks for a prefix, the first non-empty of the global
//! default prefix, the author-suggested prefix and the package id is used.

use crate::desired::ContentItem;
use serde::{Deserialize, Serialize};
use skillsync_fs::NormalizedPath;

/// Project-wide prefix settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrefixPolicy {
    /// Global default prefix
    pub default: Option<String>,
    /// Prefix every item that does not opt out
    pub always: bool,
}

/// Resolve the sanitized prefix for an item, if any.
pub fn resolve_prefix(item: &ContentItem, policy: &PrefixPolicy) -> Option<String> {
    if let Some(explicit) = &item.prefix {
        return non_empty(sanitize_prefix(explicit));
    }

    let wanted = item.use_prefix.unwrap_or(policy.always);
    if !wanted {
        return None;
    }

    [
        policy.default.as_deref(),
        item.suggested_prefix.as_deref(),
        item.package_id.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(sanitize_prefix)
    .find(|p| !p.is_empty())
}

/// Make a prefix safe to use inside a single path segment.
///
/// `@scope/name` becomes `scope-name`.
pub fn sanitize_prefix(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('@')
        .replace(['/', '\\'], "-")
        .trim_matches('-')
        .to_string()
}

/// Join `prefix` onto the first segment of `relative`.
///
/// `review/SKILL.md` with `acme` becomes `acme-review/SKILL.md`.
pub fn apply_prefix(relative: &NormalizedPath, prefix: &str) -> NormalizedPath {
    let mut segments = relative.segments();
    let Some(first) = segments.next() else {
        return relative.clone();
    };
    let mut prefixed = NormalizedPath::new(format!("{prefix}-{first}"));
    for segment in segments {
        prefixed = prefixed.join(segment);
    }
    prefixed
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
