//! Block parsing for managed comment blocks.
//!
//! Parses id-tagged blocks in line-oriented files:
//! ```text
//! # skillsync:begin <id>
//! content here
//! # skillsync:end <id>
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// A parsed block with its id, content, and position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The id identifying this block (the owning package).
    pub id: String,
    /// The lines between the markers, joined with `\n`.
    pub content: String,
    /// 0-based index of the opening marker line.
    pub start_line: usize,
    /// 0-based index of the closing marker line.
    pub end_line: usize,
}

/// Matches an opening marker line and captures the id.
static BEGIN_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*skillsync:begin\s+(\S+)\s*$").expect("Invalid begin marker regex")
});

/// Matches a closing marker line and captures the id.
static END_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*skillsync:end\s+(\S+)\s*$").expect("Invalid end marker regex")
});

pub(crate) fn begin_marker(id: &str) -> String {
    format!("# skillsync:begin {id}")
}

pub(crate) fn end_marker(id: &str) -> String {
    format!("# skillsync:end {id}")
}

/// Parses all blocks from the given content, in order of appearance.
///
/// An opening marker without a matching closing marker is ignored and its
/// lines are treated as user content.
///
/// # Example
/// ```
/// use skillsync_blocks::parser::parse_blocks;
///
/// let content = "node_modules/\n# skillsync:begin pkg\n/a.md\n# skillsync:end pkg\n";
/// let blocks = parse_blocks(content);
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].id, "pkg");
/// assert_eq!(blocks[0].content, "/a.md");
/// ```
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let Some(caps) = BEGIN_MARKER_REGEX.captures(lines[idx].trim_end()) else {
            idx += 1;
            continue;
        };
        let id = caps[1].to_string();

        let close = lines[idx + 1..].iter().position(|line| {
            END_MARKER_REGEX
                .captures(line.trim_end())
                .is_some_and(|c| c[1] == *id)
        });

        match close {
            Some(offset) => {
                let end = idx + 1 + offset;
                blocks.push(Block {
                    id,
                    content: lines[idx + 1..end].join("\n"),
                    start_line: idx,
                    end_line: end,
                });
                idx = end + 1;
            }
            None => {
                tracing::debug!(id = %id, "Unterminated managed block, treating as user content");
                idx += 1;
            }
        }
    }

    blocks
}

/// Finds a specific block by its id.
pub fn find_block(content: &str, id: &str) -> Option<Block> {
    parse_blocks(content).into_iter().find(|b| b.id == id)
}

/// Checks whether a block with the given id exists.
pub fn has_block(content: &str, id: &str) -> bool {
    find_block(content, id).is_some()
}
