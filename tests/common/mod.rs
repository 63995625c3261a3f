//! Common test utilities for pixeltext integration tests.
//!
//! Provides `TestEnv` for setting up an isolated data directory with an
//! index store, and `ScriptedExtractor`, a stand-in OCR engine whose answers
//! are set per file name.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use pixeltext::error::{ExtractError, ExtractResult};
use pixeltext::services::{IndexMaintainer, IndexStore, SearchEngine, TextExtractor};
use pixeltext::FileEvent;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Extractor answering from a table keyed by file name.
///
/// Unknown files fail with an engine error. When a gate is installed, every
/// call blocks until the test releases it.
#[derive(Default)]
pub struct ScriptedExtractor {
    answers: Mutex<HashMap<String, Option<String>>>,
    calls: AtomicUsize,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extraction of `name` returns `text`.
    pub fn answer(&self, name: &str, text: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(name.to_string(), Some(text.to_string()));
    }

    /// Extraction of `name` fails.
    pub fn fail(&self, name: &str) {
        self.answers.lock().unwrap().insert(name.to_string(), None);
    }

    /// Makes every call wait for a token; returns the sender releasing them.
    pub fn install_gate(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for ScriptedExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.recv_timeout(Duration::from_secs(10))
                .expect("gate was never released");
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match self.answers.lock().unwrap().get(&name).cloned() {
            Some(Some(text)) => Ok(text),
            _ => Err(ExtractError::Engine {
                path: path.to_path_buf(),
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// A data directory, an index store and an extractor wired together.
pub struct TestEnv {
    pub dir: TempDir,
    pub store: Arc<IndexStore>,
    pub extractor: Arc<ScriptedExtractor>,
}

impl TestEnv {
    /// Creates a new environment with an empty index.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(
            IndexStore::open(&dir.path().join("data")).expect("Failed to open index store"),
        );
        Self {
            dir,
            store,
            extractor: Arc::new(ScriptedExtractor::new()),
        }
    }

    pub fn maintainer(&self) -> IndexMaintainer {
        IndexMaintainer::new(
            Arc::clone(&self.store),
            Arc::clone(&self.extractor) as Arc<dyn TextExtractor>,
        )
    }

    pub fn search(&self) -> SearchEngine {
        SearchEngine::new(Arc::clone(&self.store))
    }

    /// Path of the persisted index file.
    pub fn index_file(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    /// Parses the persisted index file.
    pub fn persisted(&self) -> HashMap<String, String> {
        let raw = fs::read_to_string(self.index_file()).expect("Failed to read index file");
        serde_json::from_str(&raw).expect("Index file is not valid JSON")
    }

    /// Path for an image name inside the temp directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Index key for an image name inside the temp directory.
    pub fn key(&self, name: &str) -> String {
        self.path(name).to_string_lossy().to_string()
    }

    /// Runs the maintainer's event loop over `events` until they are all
    /// processed.
    pub async fn run_events(&self, events: Vec<FileEvent>) -> pixeltext::services::MaintainerStats {
        let (tx, rx) = tokio::sync::mpsc::channel(events.len().max(1));
        for event in events {
            tx.send(event).await.expect("channel closed");
        }
        drop(tx);

        self.maintainer()
            .run(rx, std::future::pending())
            .await
            .expect("maintainer failed")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
