//! Durable path→text index.
//!
//! The whole index is rewritten on every mutation. That is O(index size)
//! per change, which is fine for the few thousand screenshots this tool is
//! meant for and is not optimized further.
//!
//! Writers are serialized by `write_lock`. A mutation builds the new index
//! from a copy, persists it, and only then publishes it, so readers never
//! observe an index that failed to reach disk.

use crate::error::{StoreError, StoreResult};
use crate::persist::{self, JsonRead};
use crate::types::Index;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info};

/// How [`IndexStore::load`] produced its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Parsed from disk.
    Loaded,
    /// No file existed; an empty one was written.
    Unavailable,
    /// File was unparsable. It is left as-is until the next mutation.
    Corrupt,
}

/// Persisted index with snapshot reads.
pub struct IndexStore {
    path: PathBuf,
    current: RwLock<Arc<Index>>,
    write_lock: Mutex<()>,
}

impl IndexStore {
    /// Opens the index inside `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CreateDir` if the directory cannot be created,
    /// or any error from [`IndexStore::load`].
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(data_dir).map_err(|source| StoreError::CreateDir {
            path: data_dir.to_path_buf(),
            source,
        })?;
        Self::open_file(data_dir.join(crate::config::INDEX_FILE_NAME))
    }

    /// Opens the index at an explicit file path.
    ///
    /// # Errors
    ///
    /// See [`IndexStore::load`].
    pub fn open_file(path: PathBuf) -> StoreResult<Self> {
        let (index, status) = Self::load(&path)?;
        debug!(path = %path.display(), ?status, entries = index.len(), "Index opened");
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(index)),
            write_lock: Mutex::new(()),
        })
    }

    /// Reads the persisted index.
    ///
    /// A missing file yields an empty index and a fresh empty file on disk.
    /// Unparsable content yields an empty index without touching the file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Read` for I/O failures other than "not found",
    /// and `StoreError::Write` if the fresh empty file cannot be written.
    pub fn load(path: &Path) -> StoreResult<(Index, LoadStatus)> {
        let read = persist::read_json::<Index>(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match read {
            JsonRead::Loaded(index) => {
                info!(path = %path.display(), entries = index.len(), "Index loaded");
                Ok((index, LoadStatus::Loaded))
            }
            JsonRead::Missing => {
                info!(path = %path.display(), "No existing index found, starting empty");
                let index = Index::new();
                write_index(path, &index)?;
                Ok((index, LoadStatus::Unavailable))
            }
            JsonRead::Corrupt(e) => {
                error!(path = %path.display(), error = %e, "Invalid index JSON, starting empty");
                Ok((Index::new(), LoadStatus::Corrupt))
            }
        }
    }

    /// Writes `index` to this store's file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` on any disk failure.
    pub fn persist(&self, index: &Index) -> StoreResult<()> {
        write_index(&self.path, index)
    }

    /// Current immutable view of the index.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Index> {
        // Lock poisoning recovery: the Arc inside is always a complete index
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<String> {
        self.snapshot().get(path).cloned()
    }

    /// Inserts or replaces the text for `path` and persists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails; the in-memory index
    /// is left unchanged in that case.
    pub fn set(&self, path: &str, text: &str) -> StoreResult<()> {
        self.mutate(|index| {
            if index.get(path).map(String::as_str) == Some(text) {
                return false;
            }
            index.insert(path.to_string(), text.to_string());
            true
        })
        .map(|_| ())
    }

    /// Removes `path` and persists. Returns false (and writes nothing) if
    /// the path was not indexed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub fn remove(&self, path: &str) -> StoreResult<bool> {
        self.mutate(|index| index.remove(path).is_some())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Location of the persisted file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the index; persists and publishes it
    /// if `change` reports a modification.
    fn mutate<F>(&self, change: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut Index) -> bool,
    {
        let _writer = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut next = Index::clone(&self.snapshot());
        if !change(&mut next) {
            return Ok(false);
        }

        self.persist(&next)?;

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::new(next);
        debug!(path = %self.path.display(), entries = current.len(), "Index saved");
        Ok(true)
    }
}

fn write_index(path: &Path, index: &Index) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(index)?;
    persist::write_atomic(path, &bytes).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
