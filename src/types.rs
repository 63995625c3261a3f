//! Core domain types for pixeltext.
//!
//! The event model is a closed set: a file is created, modified or
//! deleted. Everything downstream dispatches on [`EventKind`] with a
//! single `match`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// In-memory index: file path to most recent extracted text.
///
/// `BTreeMap` gives a stable enumeration order (sorted by path), which is
/// the order search results come back in.
pub type Index = BTreeMap<String, String>;

/// Kind of filesystem change the maintainer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
}

impl EventKind {
    /// Whether this event requires running text extraction.
    #[must_use]
    pub const fn needs_extraction(self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// A filtered filesystem change for a single image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: EventKind,
    pub path: PathBuf,
}

impl FileEvent {
    #[must_use]
    pub fn new(kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::Created, path)
    }

    #[must_use]
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::Modified, path)
    }

    #[must_use]
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(EventKind::Deleted, path)
    }

    /// Index key for this event's path.
    #[must_use]
    pub fn key(&self) -> String {
        index_key(&self.path)
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path.display())
    }
}

/// Converts a filesystem path into the string key used by the index.
#[must_use]
pub fn index_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Liveness of a configured watch directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    /// Exists and is being monitored.
    Active,
    /// Configured but absent when the watcher started. Not retried.
    Missing,
}

/// Case-insensitive suffix filter over file names.
///
/// Entries carry their leading dot (`".png"`), matching the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    suffixes: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { suffixes }
    }

    /// Returns true if the path ends with one of the allowed suffixes.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let name = path.to_string_lossy().to_lowercase();
        self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

// Compile-time assertions for thread safety.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<EventKind>();
    assert_send_sync::<FileEvent>();
    assert_send_sync::<ExtensionFilter>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_filter_case_insensitive() {
        let filter = ExtensionFilter::new([".png", ".JPG"]);
        assert!(filter.matches(Path::new("/pics/a.png")));
        assert!(filter.matches(Path::new("/pics/B.PNG")));
        assert!(filter.matches(Path::new("/pics/c.jpg")));
        assert!(!filter.matches(Path::new("/pics/notes.txt")));
        assert!(!filter.matches(Path::new("/pics/png")));
    }

    #[test]
    fn test_extension_filter_empty_matches_nothing() {
        let filter = ExtensionFilter::new(Vec::<String>::new());
        assert!(!filter.matches(Path::new("a.png")));
    }

    #[test]
    fn test_needs_extraction() {
        assert!(EventKind::Created.needs_extraction());
        assert!(EventKind::Modified.needs_extraction());
        assert!(!EventKind::Deleted.needs_extraction());
    }

    #[test]
    fn test_event_display() {
        let event = FileEvent::deleted("/pics/a.png");
        assert_eq!(event.to_string(), "deleted /pics/a.png");
    }
}
