//! Profile registry and resolution for skillsync.
//!
//! A *profile* is one external consumer of synchronized content (an editor
//! or agent) with its own storage convention: where content files go, which
//! JSON document holds configuration entries, the key those entries live
//! under, and how each entry must be reshaped.
//!
//! # Architecture
//!
//! - [`ProfileRegistry`] holds the known profiles in a stable order. It is
//!   seeded with built-ins and can be extended from settings, so new
//!   profiles need no code change. Unknown ids resolve to a conventional
//!   layout (`.{id}/skills`, `.{id}/mcp.json`).
//! - [`EntryTransform`] is a declarative, pure reshaping of one
//!   configuration entry from the canonical schema into a profile's schema.
//! - [`ProfileResolver`] picks the active profile ids for a run from an
//!   explicit list, marker detection, or a default list.

mod builtins;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod transform;
pub mod types;

pub use builtins::{BUILTIN_COUNT, builtin_profiles};
pub use error::{Error, Result};
pub use registry::ProfileRegistry;
pub use resolver::{ProfileResolver, ResolvedProfiles, SelectionSource, parse_profile_list};
pub use transform::{EntryTransform, FieldCollapse};
pub use types::{
    CANONICAL_ROOT_KEY, DEFAULT_CONFIG_FILE, DEFAULT_CONTENT_DIR, Profile, ProfileDefinition,
    ProfileOrigin, validate_profile_id,
};
