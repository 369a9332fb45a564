//! File I/O used by the reconciliation passes
//!
//! Writes go through a temp-file-then-rename step so a document is never
//! observed half-written. Removal helpers are idempotent: a path that is
//! already gone counts as removed.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file.
///
/// Parent directories are created as needed. The content lands in a temp
/// file in the same directory and is then renamed over the target.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    drop(temp_file);

    if let Err(e) = fs::rename(&temp_path, &native_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&native_path, e));
    }

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content, treating a missing file as `None`.
pub fn read_text_optional(path: &NormalizedPath) -> Result<Option<String>> {
    match read_text(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Write `content` only if the bytes on disk differ.
///
/// Returns `true` when the file was written.
pub fn write_if_changed(path: &NormalizedPath, content: &[u8]) -> Result<bool> {
    let native_path = path.to_native();
    match fs::read(&native_path) {
        Ok(existing) if existing == content => {
            tracing::debug!(path = %path, "Content unchanged, skipping write");
            Ok(false)
        }
        Ok(_) => write_atomic(path, content).map(|()| true),
        Err(e) if e.kind() == ErrorKind::NotFound => write_atomic(path, content).map(|()| true),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Copy `source` to `dest`, creating parent directories and overwriting
/// whatever is at `dest`.
pub fn copy_file(source: &Path, dest: &NormalizedPath) -> Result<()> {
    let native_dest = dest.to_native();
    if let Some(parent) = native_dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::copy(source, &native_dest).map_err(|e| Error::io(&native_dest, e))?;
    Ok(())
}

/// Remove a file. A missing file is not an error.
///
/// Returns `true` if a file was actually deleted.
pub fn remove_file_if_exists(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Remove a directory only if it exists and has no entries.
///
/// Returns `true` if the directory was deleted.
pub fn remove_dir_if_empty(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    let mut entries = match fs::read_dir(&native_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(native_path, e)),
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    match fs::remove_dir(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Delete `start` and its ancestors while they are empty directories.
///
/// The walk stops at the first non-empty directory and never touches
/// `stop_at` itself or anything outside of it. Returns the directories
/// that were removed, deepest first.
pub fn prune_empty_dirs(
    start: &NormalizedPath,
    stop_at: &NormalizedPath,
) -> Result<Vec<NormalizedPath>> {
    let mut removed = Vec::new();
    let mut current = Some(start.clone());

    while let Some(dir) = current {
        if dir.relative_to(stop_at).is_none() {
            break;
        }
        if !remove_dir_if_empty(&dir)? {
            break;
        }
        tracing::debug!(dir = %dir, "Removed empty directory");
        current = dir.parent();
        removed.push(dir);
    }

    Ok(removed)
}

/// Recursively list every regular file under `dir`, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current).map_err(|e| Error::io(&current, e))? {
            let entry = entry.map_err(|e| Error::io(&current, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Canonicalize a project root without Windows verbatim prefixes.
pub fn canonical_root(path: &Path) -> Result<NormalizedPath> {
    dunce::canonicalize(path)
        .map(NormalizedPath::new)
        .map_err(|e| Error::io(path, e))
}
