//! Fragment documents
//!
//! A fragment uses the canonical, profile-agnostic schema:
//!
//! ```json
//! { "mcpServers": { "alpha": { "type": "stdio", "command": "run", "args": ["x"] } } }
//! ```

use crate::desired::{FragmentSource, resolve_input};
use serde_json::{Map, Value};
use skillsync_fs::{ConfigStore, NormalizedPath};
use skillsync_profiles::CANONICAL_ROOT_KEY;
use std::collections::BTreeMap;

/// Named entries contributed by one package.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFragment {
    pub package_id: String,
    pub entries: Map<String, Value>,
}

impl ConfigFragment {
    pub fn new(package_id: impl Into<String>, entries: Map<String, Value>) -> Self {
        Self {
            package_id: package_id.into(),
            entries,
        }
    }

    /// Read the fragment behind `source`.
    ///
    /// Missing, unparsable and malformed documents yield `Err` with a
    /// warning message; the caller skips them.
    pub fn load(root: &NormalizedPath, source: &FragmentSource) -> Result<Self, String> {
        let path = resolve_input(root, &source.path);
        if !path.is_file() {
            return Err(format!("Skipping fragment {}: file not found", source.path));
        }
        let document: Value = ConfigStore::new()
            .load(&path)
            .map_err(|e| format!("Skipping fragment {}: {e}", source.path))?;
        Self::from_document(source.package(), &document)
            .map_err(|reason| format!("Skipping fragment {}: {reason}", source.path))
    }

    /// Extract entries from a canonical document.
    pub fn from_document(package_id: &str, document: &Value) -> Result<Self, String> {
        let Value::Object(doc) = document else {
            return Err("document is not an object".into());
        };
        match doc.get(CANONICAL_ROOT_KEY) {
            Some(Value::Object(entries)) => Ok(Self::new(package_id, entries.clone())),
            Some(_) => Err(format!("'{CANONICAL_ROOT_KEY}' is not an object")),
            None => Err(format!("no '{CANONICAL_ROOT_KEY}' key")),
        }
    }
}

/// Union fragment entries in order; a later fragment wins a name.
pub fn union_entries(fragments: &[ConfigFragment]) -> BTreeMap<String, Value> {
    let mut union: BTreeMap<String, Value> = BTreeMap::new();
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    for fragment in fragments {
        for (name, entry) in &fragment.entries {
            if let Some(previous) = owners.insert(name, &fragment.package_id) {
                tracing::debug!(
                    entry = %name,
                    replaced = previous,
                    by = %fragment.package_id,
                    "Entry declared by several fragments"
                );
            }
            union.insert(name.clone(), entry.clone());
        }
    }
    union
}
