//! Full `watch` pipeline against the real filesystem watcher.

mod common;

use common::ScriptedExtractor;
use pixeltext::config::Config;
use pixeltext::error::{ExtractError, ExtractResult};
use pixeltext::services::{IndexStore, SearchEngine, TextExtractor};
use pixeltext::tools::{execute_watch, WatchInput};
use pixeltext::WatchState;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;

fn config_for(root: &TempDir, watched: Vec<std::path::PathBuf>) -> Config {
    Config {
        watch_directories: watched,
        data_dir: root.path().join("data"),
        ..Config::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_indexes_new_image_and_ignores_other_files() {
    let root = TempDir::new().unwrap();
    let pics = root.path().join("pics");
    fs::create_dir_all(pics.join("nested")).unwrap();
    let missing = root.path().join("not-created");

    let extractor = Arc::new(ScriptedExtractor::new());
    extractor.answer("photo1.png", "Hello World");
    extractor.answer("notes.txt", "should never be asked");

    let config = config_for(&root, vec![pics.clone(), missing.clone()]);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let writer = {
        let pics = pics.clone();
        let index_path = config.index_path();
        tokio::spawn(async move {
            // Give the watcher time to subscribe
            tokio::time::sleep(Duration::from_millis(300)).await;
            fs::write(pics.join("notes.txt"), "plain text").unwrap();
            fs::write(pics.join("nested").join("photo1.png"), b"fake image bytes").unwrap();

            let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
            loop {
                let raw = fs::read_to_string(&index_path).unwrap_or_default();
                if raw.contains("photo1.png") || tokio::time::Instant::now() > deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            let _ = stop_tx.send(());
        })
    };

    let out = execute_watch(
        &config,
        Arc::clone(&extractor) as Arc<dyn TextExtractor>,
        WatchInput::default(),
        async {
            let _ = stop_rx.await;
        },
    )
    .await
    .unwrap();
    writer.await.unwrap();

    assert_eq!(out.directories.len(), 2);
    assert_eq!(out.directories[0].state, WatchState::Active);
    assert_eq!(out.directories[1].state, WatchState::Missing);
    assert_eq!(out.directories[1].path, missing);
    assert!(out.stats.indexed >= 1);

    let store = Arc::new(IndexStore::open(&config.data_dir).unwrap());
    let hits = SearchEngine::new(store).search("hello");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].ends_with("photo1.png"));

    // The text file never reached the extractor
    assert!(out.stats.failed == 0);
}

#[tokio::test]
async fn test_watch_with_no_directories_stops_on_shutdown() {
    let root = TempDir::new().unwrap();
    let config = config_for(&root, Vec::new());

    let out = execute_watch(
        &config,
        Arc::new(ScriptedExtractor::new()) as Arc<dyn TextExtractor>,
        WatchInput::default(),
        async {},
    )
    .await
    .unwrap();

    assert!(out.directories.is_empty());
    assert_eq!(out.stats.events, 0);
    assert!(config.index_path().exists());
}

/// Fails unless the image on disk has been completely written.
struct CompleteFileExtractor;

impl TextExtractor for CompleteFileExtractor {
    fn extract(&self, path: &Path) -> ExtractResult<String> {
        let bytes = fs::read(path).map_err(|source| ExtractError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.ends_with(b"END") {
            Ok("Slow Upload".to_string())
        } else {
            Err(ExtractError::Engine {
                path: path.to_path_buf(),
                message: "truncated image".to_string(),
            })
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_waits_for_slow_writes_to_settle() {
    let root = TempDir::new().unwrap();
    let pics = root.path().join("pics");
    fs::create_dir_all(&pics).unwrap();

    let config = config_for(&root, vec![pics.clone()]);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let writer = {
        let index_path = config.index_path();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;

            // Two writes well inside the debounce window
            let mut file = fs::File::create(pics.join("slow.png")).unwrap();
            file.write_all(b"PNG header ").unwrap();
            file.flush().unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
            file.write_all(b"END").unwrap();
            drop(file);

            let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
            loop {
                let raw = fs::read_to_string(&index_path).unwrap_or_default();
                if raw.contains("slow.png") || tokio::time::Instant::now() > deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            // Let trailing modify events through
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = stop_tx.send(());
        })
    };

    let out = execute_watch(
        &config,
        Arc::new(CompleteFileExtractor) as Arc<dyn TextExtractor>,
        WatchInput {
            max_concurrent_jobs: 4,
            debounce_ms: 500,
        },
        async {
            let _ = stop_rx.await;
        },
    )
    .await
    .unwrap();
    writer.await.unwrap();

    assert!(out.stats.indexed >= 1);
    assert_eq!(out.stats.failed, 0);

    let store = Arc::new(IndexStore::open(&config.data_dir).unwrap());
    let hits = SearchEngine::new(store).search("slow upload");
    assert_eq!(hits.len(), 1);
}
