//! Ignore hints for managed content
//!
//! Each content root gets a `.gitignore` with one managed block per
//! owning package, listing exactly the paths written there:
//!
//! ```text
//! # user rules stay untouched
//! *.bak
//!
//! # skillsync:begin acme-tools
//! /acme-review/SKILL.md
//! # skillsync:end acme-tools
//! ```

use crate::Result;
use skillsync_fs::{NormalizedPath, ProjectPath, io};
use std::collections::{BTreeMap, BTreeSet};

/// Block id for a package. Block markers cannot contain whitespace.
pub fn hint_id(package: &str) -> String {
    package
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Escape a literal path for use as a gitignore pattern.
///
/// Glob metacharacters and backslashes get a backslash, and so do
/// trailing spaces, which git would otherwise strip.
fn escape_pattern(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\' | '!' | '#') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    let kept = escaped.trim_end_matches(' ').len();
    let trailing = escaped.len() - kept;
    escaped.truncate(kept);
    for _ in 0..trailing {
        escaped.push_str("\\ ");
    }
    escaped
}

/// Rewrite the ignore file in `content_root`.
///
/// `entries` maps package ids to paths relative to `content_root`.
/// Blocks for packages not in `entries` are removed, lines outside
/// blocks are preserved, and the file is deleted once nothing is left.
/// Returns `true` if the file changed.
pub fn refresh_ignore_hints(
    content_root: &NormalizedPath,
    entries: &BTreeMap<String, BTreeSet<String>>,
) -> Result<bool> {
    let path = content_root.join(ProjectPath::IgnoreFile.as_str());
    let existing = io::read_text_optional(&path)?.unwrap_or_default();

    let wanted: BTreeMap<String, &BTreeSet<String>> = entries
        .iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(package, paths)| (hint_id(package), paths))
        .collect();

    let mut content = skillsync_blocks::retain_blocks(&existing, |id| wanted.contains_key(id));
    for (id, paths) in &wanted {
        let body = paths
            .iter()
            .map(|p| format!("/{}", escape_pattern(p)))
            .collect::<Vec<_>>()
            .join("\n");
        content = skillsync_blocks::upsert_block(&content, id, &body)?;
    }

    if content.trim().is_empty() {
        let removed = io::remove_file_if_exists(&path)?;
        if removed {
            tracing::debug!(path = %path, "Removed empty ignore file");
        }
        return Ok(removed);
    }
    if content == existing {
        return Ok(false);
    }
    Ok(io::write_if_changed(&path, content.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        pairs
            .iter()
            .map(|(pkg, paths)| (pkg.to_string(), paths.iter().map(|p| p.to_string()).collect()))
            .collect()
    }

    #[test]
    fn writes_one_block_per_package() {
        let temp = TempDir::new().unwrap();
        let root = NormalizedPath::new(temp.path());

        refresh_ignore_hints(&root, &entries(&[("a", &["x/SKILL.md"]), ("b", &["y.md"])])).unwrap();

        let content = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert_eq!(
            content,
            "# skillsync:begin a\n/x/SKILL.md\n# skillsync:end a\n\n# skillsync:begin b\n/y.md\n# skillsync:end b\n"
        );
    }

    #[test]
    fn preserves_user_lines_and_drops_stale_blocks() {
        let temp = TempDir::new().unwrap();
        let root = NormalizedPath::new(temp.path());
        fs::write(
            temp.path().join(".gitignore"),
            "*.bak\n\n# skillsync:begin old\n/old.md\n# skillsync:end old\n",
        )
        .unwrap();

        refresh_ignore_hints(&root, &entries(&[("new", &["new.md"])])).unwrap();

        let content = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert!(content.starts_with("*.bak\n"));
        assert!(!content.contains("old.md"));
        assert!(content.contains("/new.md"));
    }

    #[test]
    fn deletes_file_when_only_managed_blocks_remain() {
        let temp = TempDir::new().unwrap();
        let root = NormalizedPath::new(temp.path());
        refresh_ignore_hints(&root, &entries(&[("a", &["x.md"])])).unwrap();

        assert!(refresh_ignore_hints(&root, &BTreeMap::new()).unwrap());
        assert!(!temp.path().join(".gitignore").exists());
    }

    #[test]
    fn unchanged_hints_are_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let root = NormalizedPath::new(temp.path());
        let hints = entries(&[("a", &["x.md"])]);
        assert!(refresh_ignore_hints(&root, &hints).unwrap());
        assert!(!refresh_ignore_hints(&root, &hints).unwrap());
    }

    #[rstest]
    #[case("plain/SKILL.md", "plain/SKILL.md")]
    #[case("[draft].md", "\\[draft\\].md")]
    #[case("what?/*.md", "what\\?/\\*.md")]
    #[case("!important.md", "\\!important.md")]
    #[case("#notes.md", "\\#notes.md")]
    #[case("back\\slash", "back\\\\slash")]
    #[case("spaced  ", "spaced\\ \\ ")]
    fn patterns_are_escaped(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(escape_pattern(path), expected);
    }

    #[test]
    fn hint_for_bracketed_file_matches_it_literally() {
        let temp = TempDir::new().unwrap();
        let root = NormalizedPath::new(temp.path());

        refresh_ignore_hints(&root, &entries(&[("a", &["[draft].md"])])).unwrap();

        let content = fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert!(content.contains("\n/\\[draft\\].md\n"));
    }
}
