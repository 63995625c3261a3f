//! Search command.

use crate::services::SearchEngine;
use serde::{Deserialize, Serialize};

/// Input for the search tool.
#[derive(Debug, Deserialize)]
pub struct SearchInput {
    /// Text to look for (case-insensitive substring)
    pub query: String,
    /// Maximum results to return (default: unlimited)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    usize::MAX
}

/// Output for the search tool.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    /// Query as given
    pub query: String,
    /// Matching image paths
    pub results: Vec<String>,
    /// Number of results returned
    pub total_returned: usize,
    /// Whether more results exist beyond `limit`
    pub has_more: bool,
}

/// Executes the search tool.
#[must_use]
pub fn execute_search(engine: &SearchEngine, input: SearchInput) -> SearchOutput {
    // Overcollect by 1 to detect if more results exist
    let mut results = engine.search_with_limit(&input.query, input.limit.saturating_add(1));
    let has_more = results.len() > input.limit;
    results.truncate(input.limit);

    SearchOutput {
        query: input.query,
        total_returned: results.len(),
        has_more,
        results,
    }
}
