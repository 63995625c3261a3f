//! Error types for pixeltext.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation. Recoverable conditions (missing or corrupt
//! files, failed extractions, missing watch directories) are absorbed by
//! the layer that sees them; what reaches the caller is listed here.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum PixelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Index store error: {0}")]
    Store(#[from] StoreError),

    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Index persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write index {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Text extraction failures. All variants are handled the same way by the
/// maintainer: logged, then treated as "no text produced".
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unreadable file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("OCR engine failed on {path}: {message}")]
    Engine { path: PathBuf, message: String },
}

/// Filesystem watcher errors.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Result type alias for top-level operations.
pub type Result<T> = std::result::Result<T, PixelError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for index store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for extraction.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for watcher operations.
pub type WatchResult<T> = std::result::Result<T, WatchError>;

// Error code implementations for machine-readable error responses
impl PixelError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::Watch(e) => e.code(),
            Self::Io(_) => "IO_ERROR",
            Self::Pipeline(_) => "PIPELINE_ERROR",
        }
    }
}

impl ConfigError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "CONFIG_READ_ERROR",
            Self::Write { .. } => "CONFIG_WRITE_ERROR",
            Self::Serialize(_) => "CONFIG_SERIALIZE_ERROR",
        }
    }
}

impl StoreError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CreateDir { .. } => "DATA_DIR_ERROR",
            Self::Read { .. } => "INDEX_READ_ERROR",
            Self::Write { .. } => "INDEX_WRITE_ERROR",
            Self::Serialize(_) => "INDEX_SERIALIZE_ERROR",
        }
    }
}

impl ExtractError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreadable { .. } => "UNREADABLE_FILE",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::Engine { .. } => "ENGINE_ERROR",
        }
    }
}

impl WatchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Notify(_) => "NOTIFY_ERROR",
        }
    }
}
