//! Core services: persistence, extraction, watching, maintenance and search.

pub mod extractor;
pub mod maintainer;
mod search;
mod store;
pub mod watcher;

pub use extractor::{TesseractExtractor, TextExtractor};
pub use maintainer::{IndexMaintainer, MaintainerConfig, MaintainerStats, Outcome};
pub use search::{search_index, SearchEngine};
pub use store::{IndexStore, LoadStatus};
pub use watcher::FileSystemWatcher;
