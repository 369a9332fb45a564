//! Filesystem primitives for skillsync
//!
//! Provides normalized path handling, idempotent writes, best-effort removal
//! with empty-directory pruning, and format-agnostic document loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::ProjectPath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
