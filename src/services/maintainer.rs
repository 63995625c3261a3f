//! Index maintenance: turns file events into index mutations.
//!
//! # Per-path policy
//!
//! At most one job runs per path. A job is the extraction (or removal) for
//! one event. While a job is in flight, later events for the same path are
//! coalesced into a single pending slot where the newest event wins. When
//! the job finishes, the pending event is processed next by the same job.
//! Events for one path are therefore applied in arrival order, with
//! intermediate ones collapsed, and a late extraction can never resurrect
//! an entry that a newer `Deleted` removed.
//!
//! Extraction runs on the blocking pool behind a semaphore, so the event
//! loop only ever does bookkeeping.

use crate::error::{PixelError, StoreResult};
use crate::services::{IndexStore, TextExtractor};
use crate::types::{EventKind, FileEvent};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// What a single event did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Text extracted and stored.
    Indexed,
    /// Extraction produced no text; index untouched.
    NoText,
    /// Extraction failed; index untouched.
    Failed,
    /// Entry removed.
    Removed,
    /// Delete for a path that was not indexed.
    Unchanged,
}

/// Tuning for the maintainer.
#[derive(Debug, Clone)]
pub struct MaintainerConfig {
    /// Extraction jobs allowed to run at once across all paths
    pub max_concurrent_jobs: usize,
}

impl Default for MaintainerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
        }
    }
}

/// Counters reported when the event loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintainerStats {
    pub events: u64,
    pub coalesced: u64,
    pub indexed: u64,
    pub no_text: u64,
    pub failed: u64,
    pub removed: u64,
}

#[derive(Default)]
struct Counters {
    events: AtomicU64,
    coalesced: AtomicU64,
    indexed: AtomicU64,
    no_text: AtomicU64,
    failed: AtomicU64,
    removed: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Indexed => &self.indexed,
            Outcome::NoText => &self.no_text,
            Outcome::Failed => &self.failed,
            Outcome::Removed => &self.removed,
            Outcome::Unchanged => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MaintainerStats {
        MaintainerStats {
            events: self.events.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            indexed: self.indexed.load(Ordering::Relaxed),
            no_text: self.no_text.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    store: Arc<IndexStore>,
    extractor: Arc<dyn TextExtractor>,
    permits: Semaphore,
    /// In-flight paths. The value is the pending event kind, if any.
    slots: Mutex<HashMap<PathBuf, Option<EventKind>>>,
    counters: Counters,
}

/// The only writer of the index store.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct IndexMaintainer {
    inner: Arc<Inner>,
}

impl IndexMaintainer {
    pub fn new(store: Arc<IndexStore>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self::with_config(store, extractor, MaintainerConfig::default())
    }

    pub fn with_config(
        store: Arc<IndexStore>,
        extractor: Arc<dyn TextExtractor>,
        config: MaintainerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                extractor,
                permits: Semaphore::new(config.max_concurrent_jobs.max(1)),
                slots: Mutex::new(HashMap::new()),
                counters: Counters::default(),
            }),
        }
    }

    /// Applies one event synchronously, blocking on extraction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if the index could not be persisted.
    /// Extraction failures are not errors; they yield `Outcome::Failed`.
    pub fn apply(&self, event: &FileEvent) -> StoreResult<Outcome> {
        self.inner.apply(event)
    }

    /// Runs the event loop until `shutdown` resolves or the channel closes.
    ///
    /// Jobs already in flight are allowed to finish before returning. A
    /// store failure stops intake of new events and is returned once the
    /// remaining jobs have drained.
    ///
    /// # Errors
    ///
    /// Returns the first `PixelError` raised by a job.
    pub async fn run<F>(
        &self,
        mut events: mpsc::Receiver<FileEvent>,
        shutdown: F,
    ) -> Result<MaintainerStats, PixelError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut jobs: JoinSet<Result<(), PixelError>> = JoinSet::new();
        let mut failure: Option<PixelError> = None;

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, finishing in-flight jobs");
                    break;
                }
                maybe = events.recv() => match maybe {
                    Some(event) => self.dispatch(event, &mut jobs),
                    None => {
                        debug!("Event channel closed");
                        break;
                    }
                },
                Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                    if let Err(e) = flatten(joined) {
                        error!(error = %e, "Index maintenance failed, stopping");
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        while let Some(joined) = jobs.join_next().await {
            if let Err(e) = flatten(joined) {
                error!(error = %e, "Index maintenance job failed");
                failure.get_or_insert(e);
            }
        }

        let stats = self.stats();
        info!(
            events = stats.events,
            indexed = stats.indexed,
            removed = stats.removed,
            failed = stats.failed,
            "Index maintainer stopped"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Starts a job for `event` or coalesces it into the path's pending slot.
    fn dispatch(&self, event: FileEvent, jobs: &mut JoinSet<Result<(), PixelError>>) {
        self.inner.counters.events.fetch_add(1, Ordering::Relaxed);

        {
            let mut slots = self.inner.slots.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(pending) = slots.get_mut(&event.path) {
                if pending.replace(event.kind).is_some() {
                    self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                }
                debug!(event = %event, "Job in flight, event queued");
                return;
            }
            slots.insert(event.path.clone(), None);
        }

        let inner = Arc::clone(&self.inner);
        jobs.spawn(async move { inner.run_job(event).await });
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> MaintainerStats {
        self.inner.counters.snapshot()
    }

    /// Number of paths with a job in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<IndexStore> {
        &self.inner.store
    }
}

impl Inner {
    fn apply(&self, event: &FileEvent) -> StoreResult<Outcome> {
        let outcome = match event.kind {
            EventKind::Created | EventKind::Modified => self.index_file(event)?,
            EventKind::Deleted => self.remove_file(event)?,
        };
        self.counters.record(outcome);
        Ok(outcome)
    }

    fn index_file(&self, event: &FileEvent) -> StoreResult<Outcome> {
        let path = &event.path;
        let text = match self.extractor.extract(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), code = e.code(), error = %e, "Text extraction failed");
                return Ok(Outcome::Failed);
            }
        };

        let text = text.trim();
        if text.is_empty() {
            warn!(path = %path.display(), "No text extracted");
            return Ok(Outcome::NoText);
        }

        self.store.set(&event.key(), text)?;
        info!(path = %path.display(), "Indexed");
        Ok(Outcome::Indexed)
    }

    fn remove_file(&self, event: &FileEvent) -> StoreResult<Outcome> {
        if self.store.remove(&event.key())? {
            info!(path = %event.path.display(), "Removed from index");
            Ok(Outcome::Removed)
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    /// Processes `event`, then any events coalesced for its path meanwhile.
    async fn run_job(self: Arc<Self>, mut event: FileEvent) -> Result<(), PixelError> {
        loop {
            let result = self.run_once(event.clone()).await;

            if let Err(e) = result {
                self.release(&event.path);
                return Err(e);
            }

            let next = {
                let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
                match slots.get_mut(&event.path).and_then(Option::take) {
                    Some(kind) => Some(kind),
                    None => {
                        slots.remove(&event.path);
                        None
                    }
                }
            };

            match next {
                Some(kind) => event.kind = kind,
                None => return Ok(()),
            }
        }
    }

    async fn run_once(self: &Arc<Self>, event: FileEvent) -> Result<Outcome, PixelError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PixelError::Pipeline(e.to_string()))?;

        let inner = Arc::clone(self);
        let outcome = tokio::task::spawn_blocking(move || inner.apply(&event))
            .await
            .map_err(|e| PixelError::Pipeline(e.to_string()))??;
        Ok(outcome)
    }

    fn release(&self, path: &Path) {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path);
    }
}

fn flatten(joined: Result<Result<(), PixelError>, JoinError>) -> Result<(), PixelError> {
    joined.map_err(|e| PixelError::Pipeline(e.to_string()))?
}
