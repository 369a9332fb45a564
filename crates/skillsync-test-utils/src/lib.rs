//! Shared test utilities for the skillsync workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`], a temporary project directory with
//!   package sources, profile markers and assertion helpers

pub mod project;

pub use project::TestProject;
