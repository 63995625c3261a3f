//! Configuration file handling.
//!
//! The config is a JSON object stored at `~/.pixeltext.json` unless a path
//! is given explicitly. Missing keys are filled from defaults and unknown
//! keys survive a load/save cycle.

use crate::error::{ConfigError, ConfigResult};
use crate::persist::{self, JsonRead};
use crate::types::ExtensionFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

/// Config file name inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".pixeltext.json";

/// Data directory name inside the home directory.
pub const DATA_DIR_NAME: &str = ".pixeltext_data";

/// Index file name inside the data directory.
pub const INDEX_FILE_NAME: &str = "index.json";

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the config file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    home_dir().join(CONFIG_FILE_NAME)
}

fn default_data_dir() -> PathBuf {
    home_dir().join(DATA_DIR_NAME)
}

fn default_valid_extensions() -> Vec<String> {
    [".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directories monitored recursively by `watch`
    #[serde(default)]
    pub watch_directories: Vec<PathBuf>,
    /// Where `index.json` lives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Lowercase extensions including the leading dot
    #[serde(default = "default_valid_extensions")]
    pub valid_extensions: Vec<String>,
    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Keys this version does not know about, written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_directories: Vec::new(),
            data_dir: default_data_dir(),
            valid_extensions: default_valid_extensions(),
            log_level: default_log_level(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Config {
    /// Builds the watcher's extension filter.
    #[must_use]
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.valid_extensions)
    }

    /// Path of the persisted index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE_NAME)
    }

    /// Maps `log_level` onto a tracing filter. Unknown names fall back to INFO.
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.trim().to_uppercase().as_str() {
            "TRACE" => LevelFilter::TRACE,
            "DEBUG" => LevelFilter::DEBUG,
            "WARN" | "WARNING" => LevelFilter::WARN,
            "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::ERROR,
            "OFF" => LevelFilter::OFF,
            _ => LevelFilter::INFO,
        }
    }
}

/// How a config load was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// Parsed from disk.
    Loaded,
    /// File was absent; defaults were written to disk.
    Created,
    /// File was unparsable; defaults are used in memory only.
    Corrupt,
}

/// Result of a watch-directory edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryChange {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

/// A config file at an explicit path.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    path: PathBuf,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Config source at [`default_config_path`].
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(default_config_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` for I/O failures other than "not found",
    /// and `ConfigError::Write` if defaults cannot be written for a missing file.
    pub fn load(&self) -> ConfigResult<Config> {
        self.load_with_status().map(|(config, _)| config)
    }

    /// Loads the config and reports which branch produced it.
    ///
    /// # Errors
    ///
    /// See [`ConfigSource::load`].
    pub fn load_with_status(&self) -> ConfigResult<(Config, ConfigStatus)> {
        let read = persist::read_json::<Config>(&self.path).map_err(|source| {
            ConfigError::Read {
                path: self.path.clone(),
                source,
            }
        })?;

        match read {
            JsonRead::Loaded(config) => {
                info!(path = %self.path.display(), "Configuration loaded");
                Ok((config, ConfigStatus::Loaded))
            }
            JsonRead::Missing => {
                warn!(path = %self.path.display(), "Config file not found, creating default config");
                let config = Config::default();
                self.save(&config)?;
                Ok((config, ConfigStatus::Created))
            }
            JsonRead::Corrupt(e) => {
                // The corrupt file is left in place; only explicit edits overwrite it.
                error!(path = %self.path.display(), error = %e, "Invalid config JSON, using defaults");
                Ok((Config::default(), ConfigStatus::Corrupt))
            }
        }
    }

    /// Writes the config as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Write` if the file cannot be written.
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        let bytes = serde_json::to_vec_pretty(config)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        persist::write_atomic(&self.path, &bytes).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Loads the config (defaults filling any gaps) and writes it back.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub fn materialize(&self) -> ConfigResult<Config> {
        let config = self.load()?;
        self.save(&config)?;
        Ok(config)
    }

    /// Appends `dir` to the watch list unless it is already there.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub fn add_directory(&self, dir: &Path) -> ConfigResult<DirectoryChange> {
        let mut config = self.load()?;
        let normalized = normalize_dir(dir);

        if config
            .watch_directories
            .iter()
            .any(|d| d == dir || *d == normalized)
        {
            return Ok(DirectoryChange::AlreadyPresent);
        }

        config.watch_directories.push(normalized);
        self.save(&config)?;
        Ok(DirectoryChange::Added)
    }

    /// Removes `dir` from the watch list if present.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    pub fn remove_directory(&self, dir: &Path) -> ConfigResult<DirectoryChange> {
        let mut config = self.load()?;
        let normalized = normalize_dir(dir);

        let before = config.watch_directories.len();
        config
            .watch_directories
            .retain(|d| d != dir && *d != normalized);

        if config.watch_directories.len() == before {
            return Ok(DirectoryChange::NotPresent);
        }

        self.save(&config)?;
        Ok(DirectoryChange::Removed)
    }
}

/// Absolute form of a user-supplied directory, so `watch` does not depend
/// on the working directory `add_directory` ran in.
fn normalize_dir(dir: &Path) -> PathBuf {
    if let Ok(canonical) = dunce::canonicalize(dir) {
        return canonical;
    }
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}
