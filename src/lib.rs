//! pixeltext: keep a searchable text index of the images in your folders.
//!
//! This library watches directories for image files, runs OCR on new or
//! changed images, and keeps a persisted path→text index in step with the
//! filesystem. Queries are case-insensitive substring matches.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  notify   ┌──────────────────┐  bounded mpsc
//! │ watch dirs   ├──────────►│ FileSystemWatcher├───────────────┐
//! └──────────────┘           │ extension filter │              │
//!                            └──────────────────┘              │
//!                                                  ┌───────────▼───────────┐
//!                                                  │    IndexMaintainer    │
//!                                                  │ one job per path,     │
//!                                                  │ coalesced events      │
//!                                                  └───┬───────────────┬───┘
//!                                   spawn_blocking     │               │ set / remove
//!                                  ┌───────────────────▼──┐   ┌────────▼────────┐
//!                                  │    TextExtractor     │   │   IndexStore    │
//!                                  │ (tesseract)          │   │ index.json      │
//!                                  └──────────────────────┘   │ temp + rename   │
//!                                                             └────────▲────────┘
//!                                                                      │ snapshot
//!                                                             ┌────────┴────────┐
//!                                                             │  SearchEngine   │
//!                                                             └─────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod fmt;
mod persist;
pub mod services;
pub mod tools;
pub mod types;

pub use config::{Config, ConfigSource};
pub use error::{PixelError, Result};
pub use types::{EventKind, ExtensionFilter, FileEvent, Index, WatchState};
