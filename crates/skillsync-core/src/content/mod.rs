//! Content reconciliation
//!
//! - [`plan`]: expand items, resolve prefixes, pre-flight conflicts
//! - [`reconciler`]: copy, retire, prune, record
//! - [`ignore`]: per-content-root ignore hints

pub mod ignore;
pub mod plan;
pub mod prefix;
pub mod reconciler;

pub use ignore::refresh_ignore_hints;
pub use plan::{Conflict, ContentPlan, PlannedFile};
pub use prefix::{PrefixPolicy, apply_prefix, resolve_prefix, sanitize_prefix};
pub use reconciler::ContentReconciler;
