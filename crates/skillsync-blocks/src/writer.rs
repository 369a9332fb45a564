//! Block writing functionality for managed comment blocks.
//!
//! Provides functions to insert, update, remove, and upsert id-tagged blocks.
//! Output always ends with a single newline unless it is empty.

use crate::error::{Error, Result};
use crate::parser::{Block, begin_marker, end_marker, find_block, parse_blocks};

fn format_block(id: &str, block_content: &str) -> String {
    let body = block_content.trim_end_matches('\n');
    if body.is_empty() {
        format!("{}\n{}", begin_marker(id), end_marker(id))
    } else {
        format!("{}\n{}\n{}", begin_marker(id), body, end_marker(id))
    }
}

fn finish(lines: &[&str]) -> String {
    let mut end = lines.len();
    while end > 0 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    if end == 0 {
        return String::new();
    }
    let mut out = lines[..end].join("\n");
    out.push('\n');
    out
}

/// Appends a new block at the end of the content.
///
/// Existing content is separated from the block by one blank line.
///
/// # Example
/// ```
/// use skillsync_blocks::writer::insert_block;
///
/// let result = insert_block("node_modules/\n", "pkg", "/a.md");
/// assert_eq!(
///     result,
///     "node_modules/\n\n# skillsync:begin pkg\n/a.md\n# skillsync:end pkg\n"
/// );
/// ```
pub fn insert_block(content: &str, id: &str, block_content: &str) -> String {
    let block = format_block(id, block_content);
    let existing = content.trim_end_matches(['\n', '\r']);

    if existing.trim().is_empty() {
        format!("{block}\n")
    } else {
        format!("{existing}\n\n{block}\n")
    }
}

/// Replaces the content of an existing block in place.
///
/// # Errors
/// Returns `Error::BlockNotFound` if no block with the given id exists.
pub fn update_block(content: &str, id: &str, new_content: &str) -> Result<String> {
    let block = find_block(content, id).ok_or_else(|| Error::BlockNotFound { id: id.into() })?;
    let lines: Vec<&str> = content.lines().collect();
    let replacement = format_block(id, new_content);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..block.start_line]);
    out.extend(replacement.lines());
    out.extend_from_slice(&lines[block.end_line + 1..]);

    Ok(finish(&out))
}

/// Removes a block, together with the blank separator line before it.
///
/// # Errors
/// Returns `Error::BlockNotFound` if no block with the given id exists.
///
/// # Example
/// ```
/// use skillsync_blocks::writer::remove_block;
///
/// let content = "user\n\n# skillsync:begin pkg\n/a.md\n# skillsync:end pkg\n";
/// assert_eq!(remove_block(content, "pkg").unwrap(), "user\n");
/// ```
pub fn remove_block(content: &str, id: &str) -> Result<String> {
    let block = find_block(content, id).ok_or_else(|| Error::BlockNotFound { id: id.into() })?;
    let lines: Vec<&str> = content.lines().collect();
    Ok(finish(&without(&lines, &[block])))
}

/// Inserts a new block or updates an existing one.
pub fn upsert_block(content: &str, id: &str, block_content: &str) -> Result<String> {
    if find_block(content, id).is_some() {
        update_block(content, id, block_content)
    } else {
        Ok(insert_block(content, id, block_content))
    }
}

/// Removes every block whose id does not satisfy `keep`.
///
/// User content and retained blocks are left untouched.
pub fn retain_blocks(content: &str, keep: impl Fn(&str) -> bool) -> String {
    let dropped: Vec<Block> = parse_blocks(content)
        .into_iter()
        .filter(|b| !keep(&b.id))
        .collect();
    if dropped.is_empty() {
        return content.to_string();
    }
    let lines: Vec<&str> = content.lines().collect();
    finish(&without(&lines, &dropped))
}

fn without<'a>(lines: &[&'a str], blocks: &[Block]) -> Vec<&'a str> {
    let mut skip = vec![false; lines.len()];
    for block in blocks {
        for flag in &mut skip[block.start_line..=block.end_line] {
            *flag = true;
        }
        if block.start_line > 0 && lines[block.start_line - 1].trim().is_empty() {
            skip[block.start_line - 1] = true;
        }
    }
    lines
        .iter()
        .zip(skip)
        .filter_map(|(line, skipped)| (!skipped).then_some(*line))
        .collect()
}
