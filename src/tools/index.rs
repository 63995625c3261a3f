//! Index maintenance commands: the long-running `watch` pipeline and `stats`.

use crate::config::Config;
use crate::error::Result;
use crate::services::watcher::DEFAULT_DEBOUNCE;
use crate::services::{
    FileSystemWatcher, IndexMaintainer, IndexStore, MaintainerConfig, MaintainerStats,
    TextExtractor,
};
use crate::types::WatchState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capacity of the watcher → maintainer event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Input for the watch tool.
#[derive(Debug, Deserialize)]
pub struct WatchInput {
    /// Extraction jobs allowed to run at once
    #[serde(default = "default_jobs")]
    pub max_concurrent_jobs: usize,
    /// How long a raw filesystem event settles before it is processed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_jobs() -> usize {
    MaintainerConfig::default().max_concurrent_jobs
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for WatchInput {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_jobs(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// A configured directory and whether it was monitored.
#[derive(Debug, Serialize)]
pub struct WatchedDirectory {
    pub path: PathBuf,
    pub state: WatchState,
}

/// Output for the watch tool, produced once the pipeline stops.
#[derive(Debug, Serialize)]
pub struct WatchOutput {
    /// Every configured directory with its state
    pub directories: Vec<WatchedDirectory>,
    /// Event counters for the session
    pub stats: MaintainerStats,
}

/// Runs the maintenance pipeline until `shutdown` resolves.
///
/// The watcher's subscriptions are released before this returns, whether
/// the pipeline stopped cleanly or on a store failure.
///
/// # Errors
///
/// Returns `PixelError::Store` if the index cannot be opened or persisted,
/// and `PixelError::Watch` if the platform watcher cannot be started.
pub async fn execute_watch<F>(
    config: &Config,
    extractor: Arc<dyn TextExtractor>,
    input: WatchInput,
    shutdown: F,
) -> Result<WatchOutput>
where
    F: Future<Output = ()>,
{
    let store = Arc::new(IndexStore::open(&config.data_dir)?);
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    let watcher = FileSystemWatcher::start(
        &config.watch_directories,
        config.extension_filter(),
        Duration::from_millis(input.debounce_ms),
        tx,
    )?;

    if watcher.active_count() == 0 {
        warn!("No watch directory is active; add one with `add_directory`");
    }
    info!(
        active = watcher.active_count(),
        indexed = store.len(),
        "Watching for image changes"
    );

    let directories = watcher
        .states()
        .iter()
        .map(|(path, state)| WatchedDirectory {
            path: path.clone(),
            state: *state,
        })
        .collect();

    let maintainer = IndexMaintainer::with_config(
        store,
        extractor,
        MaintainerConfig {
            max_concurrent_jobs: input.max_concurrent_jobs,
        },
    );

    let result = maintainer.run(rx, shutdown).await;
    watcher.stop();

    Ok(WatchOutput {
        directories,
        stats: result?,
    })
}

/// Input for the stats tool.
#[derive(Debug, Default, Deserialize)]
pub struct StatsInput {
    /// Whether to include a per-extension breakdown
    #[serde(default)]
    pub detailed: bool,
}

/// Output for the stats tool.
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    /// Total indexed images
    pub total_files: usize,
    /// Persisted index location
    pub index_path: PathBuf,
    /// Persisted index size
    pub index_size: IndexSize,
    /// Breakdown by extension (if detailed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_type: Option<BTreeMap<String, u64>>,
}

/// Index size information.
#[derive(Debug, Serialize)]
pub struct IndexSize {
    /// Size on disk in bytes
    pub bytes: u64,
    /// Human-readable size
    pub human: String,
}

/// Reports what the index currently holds.
///
/// # Errors
///
/// Returns `PixelError::Io` if the index file's metadata cannot be read.
pub fn execute_stats(store: &IndexStore, input: StatsInput) -> Result<StatsOutput> {
    let snapshot = store.snapshot();
    let bytes = std::fs::metadata(store.path())?.len();

    let by_type = input.detailed.then(|| {
        let mut counts = BTreeMap::new();
        for path in snapshot.keys() {
            let ext = Path::new(path)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "(none)".to_string());
            *counts.entry(ext).or_insert(0) += 1;
        }
        counts
    });

    Ok(StatsOutput {
        total_files: snapshot.len(),
        index_path: store.path().to_path_buf(),
        index_size: IndexSize {
            bytes,
            human: human_size(bytes),
        },
        by_type,
    })
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
