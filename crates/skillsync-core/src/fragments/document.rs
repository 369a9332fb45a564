//! Shared configuration documents
//!
//! Documents are parsed into a tree, transformed as a value and rendered
//! back. Rendering is deterministic (sorted keys, two-space indentation,
//! `\n` line endings, trailing newline) so unchanged input renders to
//! identical bytes.

use crate::Result;
use serde_json::{Map, Value};
use skillsync_fs::{NormalizedPath, io};

/// What was found at a document path.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    /// No file
    Absent,
    /// A JSON object
    Parsed(Map<String, Value>),
    /// A file that is not a JSON object
    Unreadable(String),
}

/// Read a configuration document without failing on its content.
///
/// Only I/O errors are returned as `Err`.
pub fn read_document(path: &NormalizedPath) -> Result<DocumentState> {
    let Some(content) = io::read_text_optional(path)? else {
        return Ok(DocumentState::Absent);
    };
    if content.trim().is_empty() {
        return Ok(DocumentState::Parsed(Map::new()));
    }
    Ok(match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => DocumentState::Parsed(map),
        Ok(_) => DocumentState::Unreadable("top level is not an object".into()),
        Err(e) => DocumentState::Unreadable(e.to_string()),
    })
}

/// Render a document deterministically.
pub fn render_document(document: &Map<String, Value>) -> Result<String> {
    let sorted = sort_keys(&Value::Object(document.clone()));
    let mut rendered = serde_json::to_string_pretty(&sorted)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Outcome of [`write_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    Deleted,
}

/// Persist `document`, deleting the file when it is empty and writing
/// only when the rendered bytes differ.
pub fn write_document(path: &NormalizedPath, document: &Map<String, Value>) -> Result<WriteOutcome> {
    if document.is_empty() {
        return Ok(if io::remove_file_if_exists(path)? {
            WriteOutcome::Deleted
        } else {
            WriteOutcome::Unchanged
        });
    }
    let rendered = render_document(document)?;
    Ok(if io::write_if_changed(path, rendered.as_bytes())? {
        WriteOutcome::Written
    } else {
        WriteOutcome::Unchanged
    })
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
