//! Managed comment blocks for skillsync.
//!
//! Ignore files written by skillsync carry one block per owning package:
//!
//! ```text
//! # skillsync:begin @acme/skills
//! /acme-review/SKILL.md
//! # skillsync:end @acme/skills
//! ```
//!
//! Everything outside the markers belongs to the user and is preserved
//! verbatim by every operation in this crate.

pub mod error;
pub mod parser;
pub mod writer;

pub use error::{Error, Result};
pub use parser::{Block, find_block, has_block, parse_blocks};
pub use writer::{insert_block, remove_block, retain_blocks, update_block, upsert_block};
