//! Core profile types

use crate::error::{Error, Result};
use crate::transform::EntryTransform;
use serde::{Deserialize, Serialize};

/// Content directory used by the conventional layout.
pub const DEFAULT_CONTENT_DIR: &str = "skills";

/// Configuration document name used by the conventional layout.
pub const DEFAULT_CONFIG_FILE: &str = "mcp.json";

/// Root key of canonical fragments, and the default profile root key.
pub const CANONICAL_ROOT_KEY: &str = "mcpServers";

/// Where a profile's definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileOrigin {
    /// Shipped in the built-in table
    Builtin,
    /// Declared or overridden in settings
    Configured,
    /// Synthesized from the id for an unregistered profile
    Convention,
}

/// A fully-resolved profile.
///
/// All paths are project-relative with forward slashes.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Lowercase machine identifier (e.g. "claude")
    pub id: String,
    /// Display name
    pub name: String,
    /// Path whose existence marks the profile as in use
    pub marker: String,
    /// Directory receiving content files
    pub content_root: String,
    /// JSON document receiving configuration entries
    pub config_path: String,
    /// Top-level key holding the entries in the document
    pub root_key: String,
    /// Reshaping applied to each entry
    pub transform: EntryTransform,
    /// Source of this definition
    pub origin: ProfileOrigin,
}

impl Profile {
    /// Build the conventional layout for an unregistered id.
    pub fn conventional(id: &str) -> Self {
        let id = id.trim().to_lowercase();
        Self {
            name: id.clone(),
            marker: format!(".{id}"),
            content_root: format!(".{id}/{DEFAULT_CONTENT_DIR}"),
            config_path: format!(".{id}/{DEFAULT_CONFIG_FILE}"),
            root_key: CANONICAL_ROOT_KEY.to_string(),
            transform: EntryTransform::identity(),
            origin: ProfileOrigin::Convention,
            id,
        }
    }

    /// Check the id and every path for safety.
    pub fn validate(&self) -> Result<()> {
        validate_profile_id(&self.id)?;
        for (field, path) in [
            ("marker", &self.marker),
            ("content_root", &self.content_root),
            ("config_path", &self.config_path),
        ] {
            validate_relative_path(&self.id, field, path)?;
        }
        if self.root_key.trim().is_empty() {
            return Err(Error::InvalidProfilePath {
                id: self.id.clone(),
                field: "root_key",
                path: self.root_key.clone(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Profile fields as written in settings.
///
/// Every field is optional; missing fields fall back to the built-in
/// profile of the same id, or to the conventional layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileDefinition {
    pub name: Option<String>,
    pub marker: Option<String>,
    pub content_root: Option<String>,
    pub config_path: Option<String>,
    pub root_key: Option<String>,
    pub transform: Option<EntryTransform>,
}

impl ProfileDefinition {
    /// Overlay this definition on `base`, producing a configured profile.
    pub fn apply_to(self, base: Profile) -> Profile {
        Profile {
            id: base.id,
            name: self.name.unwrap_or(base.name),
            marker: self.marker.unwrap_or(base.marker),
            content_root: self.content_root.unwrap_or(base.content_root),
            config_path: self.config_path.unwrap_or(base.config_path),
            root_key: self.root_key.unwrap_or(base.root_key),
            transform: self.transform.unwrap_or(base.transform),
            origin: ProfileOrigin::Configured,
        }
    }
}

/// Validate a profile id.
///
/// Ids become directory names in the conventional layout, so they must be
/// a single safe path segment.
pub fn validate_profile_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        Some("must not be empty")
    } else if id.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if id.starts_with('.') {
        Some("must not start with '.'")
    } else if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("must not contain whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidProfileId {
            id: id.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}

fn validate_relative_path(id: &str, field: &'static str, path: &str) -> Result<()> {
    let normalized = path.replace('\\', "/");
    let reason = if normalized.trim().is_empty() {
        Some("must not be empty")
    } else if normalized.starts_with('/') || normalized.as_bytes().get(1) == Some(&b':') {
        Some("must be relative to the project root")
    } else if normalized.split('/').any(|segment| segment == "..") {
        Some("must not contain '..'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidProfilePath {
            id: id.to_string(),
            field,
            path: path.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}
