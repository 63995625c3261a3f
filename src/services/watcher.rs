//! Recursive directory watcher.
//!
//! Wraps a debounced `notify` watcher, converts raw notifications into
//! [`FileEvent`]s and drops everything that is not an allowed image file
//! before it reaches the maintainer. Events are held back until they are
//! `debounce` old, so an image that is still being written is not read
//! straight after its `Create`.

use crate::error::WatchResult;
use crate::types::{EventKind as FileEventKind, ExtensionFilter, FileEvent, WatchState};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Delay applied to raw notifications before they are forwarded.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the configured directories until stopped.
pub struct FileSystemWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    states: Vec<(PathBuf, WatchState)>,
}

impl FileSystemWatcher {
    /// Starts watching every existing directory in `dirs`.
    ///
    /// Directories that do not exist are recorded as [`WatchState::Missing`]
    /// and never retried. Converted events are sent on `events`; the
    /// debouncer thread blocks when the channel is full.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Notify` if the platform watcher cannot be created
    /// or an existing directory cannot be subscribed.
    pub fn start(
        dirs: &[PathBuf],
        filter: ExtensionFilter,
        debounce: Duration,
        events: mpsc::Sender<FileEvent>,
    ) -> WatchResult<Self> {
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(batch) => {
                    for event in batch {
                        for file_event in convert_event(&event.event, &filter) {
                            debug!(event = %file_event, "File event");
                            // Runs on the debouncer's own thread, never inside the runtime
                            if events.blocking_send(file_event).is_err() {
                                debug!("Event channel closed");
                                return;
                            }
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "File watcher error");
                    }
                }
            }
        })?;

        let mut states = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !dir.exists() {
                warn!(dir = %dir.display(), "Watch directory does not exist, skipping");
                states.push((dir.clone(), WatchState::Missing));
                continue;
            }

            let dir = dunce::canonicalize(dir).unwrap_or_else(|_| dir.clone());
            debouncer.watch(&dir, RecursiveMode::Recursive)?;
            info!(dir = %dir.display(), "Watching directory");
            states.push((dir, WatchState::Active));
        }

        Ok(Self { debouncer, states })
    }

    /// Every configured directory with its liveness.
    #[must_use]
    pub fn states(&self) -> &[(PathBuf, WatchState)] {
        &self.states
    }

    /// Number of directories actually being monitored.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.states
            .iter()
            .filter(|(_, s)| *s == WatchState::Active)
            .count()
    }

    /// Releases every filesystem subscription. Events still inside the
    /// debounce window are dropped.
    pub fn stop(mut self) {
        for (dir, state) in &self.states {
            if *state != WatchState::Active {
                continue;
            }
            if let Err(e) = self.debouncer.unwatch(dir) {
                warn!(dir = %dir.display(), error = %e, "Failed to unwatch directory");
            }
        }
        self.debouncer.stop();
        info!("Directory watcher stopped");
    }
}

/// Converts a raw notification into zero or more filtered file events.
#[must_use]
pub fn convert_event(event: &Event, filter: &ExtensionFilter) -> Vec<FileEvent> {
    let paths = &event.paths;
    let mut out = Vec::new();

    match &event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {}
        EventKind::Create(_) => {
            out.extend(paths.iter().map(FileEvent::created));
        }
        EventKind::Remove(_) => {
            out.extend(paths.iter().map(FileEvent::deleted));
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => out.extend(paths.iter().map(FileEvent::deleted)),
            RenameMode::To => out.extend(paths.iter().map(FileEvent::created)),
            RenameMode::Both => {
                if let [from, to, ..] = paths.as_slice() {
                    out.push(FileEvent::deleted(from));
                    out.push(FileEvent::created(to));
                }
            }
            _ => {
                for path in paths {
                    let kind = if path.exists() {
                        FileEventKind::Modified
                    } else {
                        FileEventKind::Deleted
                    };
                    out.push(FileEvent::new(kind, path));
                }
            }
        },
        EventKind::Modify(_) => {
            out.extend(paths.iter().map(FileEvent::modified));
        }
        _ => {}
    }

    out.retain(|e| {
        filter.matches(&e.path) && !(e.kind.needs_extraction() && e.path.is_dir())
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;
    use tempfile::TempDir;

    fn filter() -> ExtensionFilter {
        ExtensionFilter::new([".png", ".jpg"])
    }

    fn make_event(kind: EventKind, paths: Vec<PathBuf>) -> Event {
        Event {
            kind,
            paths,
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_convert_create() {
        let path = PathBuf::from("/pics/photo1.png");
        let event = make_event(EventKind::Create(CreateKind::File), vec![path.clone()]);
        assert_eq!(convert_event(&event, &filter()), vec![FileEvent::created(path)]);
    }

    #[test]
    fn test_convert_modify() {
        let path = PathBuf::from("/pics/photo1.PNG");
        let event = make_event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            vec![path.clone()],
        );
        assert_eq!(convert_event(&event, &filter()), vec![FileEvent::modified(path)]);
    }

    #[test]
    fn test_convert_remove() {
        let path = PathBuf::from("/pics/photo1.jpg");
        let event = make_event(EventKind::Remove(RemoveKind::File), vec![path.clone()]);
        assert_eq!(convert_event(&event, &filter()), vec![FileEvent::deleted(path)]);
    }

    #[test]
    fn test_disallowed_extension_dropped() {
        let event = make_event(
            EventKind::Create(CreateKind::File),
            vec![PathBuf::from("/pics/notes.txt")],
        );
        assert!(convert_event(&event, &filter()).is_empty());
    }

    #[test]
    fn test_folder_events_dropped() {
        let event = make_event(
            EventKind::Create(CreateKind::Folder),
            vec![PathBuf::from("/pics/album.png")],
        );
        assert!(convert_event(&event, &filter()).is_empty());
    }

    #[test]
    fn test_existing_directory_with_image_suffix_dropped() {
        let dir = TempDir::new().unwrap();
        let odd = dir.path().join("looks-like.png");
        std::fs::create_dir(&odd).unwrap();
        let event = make_event(EventKind::Create(CreateKind::Any), vec![odd]);
        assert!(convert_event(&event, &filter()).is_empty());
    }

    #[test]
    fn test_rename_both_becomes_delete_and_create() {
        let from = PathBuf::from("/pics/old.png");
        let to = PathBuf::from("/pics/new.png");
        let event = make_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            vec![from.clone(), to.clone()],
        );
        assert_eq!(
            convert_event(&event, &filter()),
            vec![FileEvent::deleted(from), FileEvent::created(to)]
        );
    }

    #[test]
    fn test_rename_to_unwatched_extension_only_deletes() {
        let from = PathBuf::from("/pics/old.png");
        let to = PathBuf::from("/pics/old.png.bak");
        let event = make_event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            vec![from.clone(), to],
        );
        assert_eq!(convert_event(&event, &filter()), vec![FileEvent::deleted(from)]);
    }

    #[test]
    fn test_access_events_ignored() {
        let event = make_event(
            EventKind::Access(notify::event::AccessKind::Any),
            vec![PathBuf::from("/pics/a.png")],
        );
        assert!(convert_event(&event, &filter()).is_empty());
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("not-there");
        let (tx, _rx) = mpsc::channel(8);

        let watcher =
            FileSystemWatcher::start(
                &[dir.path().to_path_buf(), missing.clone()],
                filter(),
                DEFAULT_DEBOUNCE,
                tx,
            )
            .unwrap();

        assert_eq!(watcher.active_count(), 1);
        assert_eq!(watcher.states()[1], (missing, WatchState::Missing));
        watcher.stop();
    }
}
