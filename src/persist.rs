//! JSON file helpers shared by the config and index layers.
//!
//! Reads report "missing" and "corrupt" as values instead of errors so
//! callers can take an explicit fallback branch. Writes go through a
//! temporary file in the target directory and are renamed into place.

use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Outcome of reading a JSON document from disk.
#[derive(Debug)]
pub(crate) enum JsonRead<T> {
    Loaded(T),
    Missing,
    Corrupt(serde_json::Error),
}

/// Reads and parses `path`.
///
/// Only I/O failures other than "not found" are returned as errors.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<JsonRead<T>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(JsonRead::Missing),
        Err(e) => return Err(e),
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(JsonRead::Loaded(value)),
        Err(e) => Ok(JsonRead::Corrupt(e)),
    }
}

/// Atomically replaces `path` with `bytes`.
///
/// The data is flushed and synced before the rename, so a crash leaves
/// either the old file or the new one, never a partial write. A symlink at
/// `path` is followed and its target replaced, and an existing file keeps
/// its permissions.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let target = resolve_symlink(path);
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    if let Ok(existing) = fs::metadata(&target) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// Final target of `path` if it is a symlink, `path` itself otherwise.
///
/// A dangling link resolves to where it points, so the first write creates
/// the target instead of replacing the link.
fn resolve_symlink(path: &Path) -> PathBuf {
    let is_link = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return path.to_path_buf();
    }

    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }
    match fs::read_link(path) {
        Ok(link) => path.parent().map_or(link.clone(), |parent| parent.join(&link)),
        Err(_) => path.to_path_buf(),
    }
}
