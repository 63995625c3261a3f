//! Case-insensitive substring search over an index snapshot.

use crate::services::IndexStore;
use crate::types::Index;
use std::sync::Arc;

/// Read-only query interface.
///
/// Each query works on one snapshot, so a concurrent write is either fully
/// visible or not visible at all.
pub struct SearchEngine {
    store: Arc<IndexStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    /// Paths whose text contains `query`, ignoring case.
    ///
    /// Results follow the index's path order. An empty query matches every
    /// indexed path.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<String> {
        search_index(&self.store.snapshot(), query, usize::MAX)
    }

    /// Like [`SearchEngine::search`], stopping after `limit` hits.
    #[must_use]
    pub fn search_with_limit(&self, query: &str, limit: usize) -> Vec<String> {
        search_index(&self.store.snapshot(), query, limit)
    }
}

/// Substring match over a single index snapshot.
#[must_use]
pub fn search_index(index: &Index, query: &str, limit: usize) -> Vec<String> {
    let needle = query.to_lowercase();
    index
        .iter()
        .filter(|(_, text)| needle.is_empty() || text.to_lowercase().contains(&needle))
        .map(|(path, _)| path.clone())
        .take(limit)
        .collect()
}
