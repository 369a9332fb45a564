//! [`TestProject`] fixture for reconciliation scenarios.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory with helpers for setup and assertion.
///
/// All paths are relative to the project root.
///
/// # Example
///
/// ```rust,no_run
/// use skillsync_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.add_marker(".claude");
/// project.write_file("packages/acme/skills/review/SKILL.md", "# Review");
/// project.assert_exists("packages/acme/skills/review/SKILL.md");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary project.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the project root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Create a profile marker directory such as `.claude`.
    pub fn add_marker(&self, marker: &str) {
        fs::create_dir_all(self.path(marker)).unwrap();
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
    }

    /// Write `value` as JSON to `rel`.
    pub fn write_json(&self, rel: &str, value: &Value) {
        self.write_file(rel, &serde_json::to_string_pretty(value).unwrap());
    }

    /// Read `rel` as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_file(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()))
    }

    /// Read `rel` as JSON.
    pub fn read_json(&self, rel: &str) -> Value {
        let content = self.read_file(rel);
        serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Invalid JSON in {rel}: {e}\n{content}"))
    }

    /// Remove a file or directory tree.
    pub fn remove(&self, rel: &str) {
        let path = self.path(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path).unwrap();
        } else {
            fs::remove_file(&path).unwrap();
        }
    }

    /// Assert that `rel` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, rel: &str) {
        let path = self.path(rel);
        assert!(path.exists(), "Expected path to exist: {}", path.display());
    }

    /// Assert that `rel` does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, rel: &str) {
        let path = self.path(rel);
        assert!(!path.exists(), "Expected path NOT to exist: {}", path.display());
    }

    /// Assert that the file at `rel` contains `needle`.
    pub fn assert_contains(&self, rel: &str, needle: &str) {
        let content = self.read_file(rel);
        assert!(
            content.contains(needle),
            "Expected {rel} to contain {needle:?}, got:\n{content}"
        );
    }
}
