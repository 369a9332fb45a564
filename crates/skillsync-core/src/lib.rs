//! Reconciliation engine for skillsync
//!
//! Keeps package-owned content files and configuration entries in sync
//! across several profiles, and undoes exactly what it installed.
//!
//! # Architecture
//!
//! ```text
//!                  skillsync-cli
//!                        |
//!                 skillsync-core
//!                        |
//!     +------------------+------------------+
//!     |                  |                  |
//! skillsync-fs   skillsync-blocks   skillsync-profiles
//! ```
//!
//! - [`manifest`]: the tracked manifest, the single record used for undo
//! - [`content`]: planning, conflict pre-flight, copy, retire, prune
//! - [`fragments`]: merging fragment entries into shared documents
//! - [`settings`]: layered TOML settings
//! - [`engine`]: the top-level operations, each returning an
//!   [`OperationReport`]
//!
//! # Example
//!
//! ```ignore
//! use skillsync_core::{DesiredState, SyncEngine};
//! use skillsync_fs::NormalizedPath;
//!
//! let engine = SyncEngine::load(NormalizedPath::new("/path/to/project"))?;
//! let profiles = engine.resolve_profiles(None);
//! let desired = DesiredState::load(&NormalizedPath::new("/path/to/project/state.json"))?;
//! let report = engine.apply(&profiles.ids, &desired);
//! assert!(report.success);
//! ```

pub mod content;
pub mod desired;
pub mod engine;
pub mod error;
pub mod fragments;
pub mod manifest;
pub mod report;
pub mod settings;

pub use content::{Conflict, ContentPlan, ContentReconciler, PrefixPolicy};
pub use desired::{ContentItem, DesiredState, FragmentSource};
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use fragments::{ConfigFragment, ConfigFragmentMerger};
pub use manifest::{ConfigRecord, ManifestStore, PackageRecord, TrackedManifest};
pub use report::OperationReport;
pub use settings::{Settings, SettingsLoader};
