//! Config and watch-list commands.

use crate::config::{Config, ConfigSource, DirectoryChange};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output for the config tool.
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    /// Where the config was written
    pub path: PathBuf,
    /// Effective configuration
    pub config: Config,
}

/// Writes the config file with every default key filled in.
///
/// # Errors
///
/// Returns `PixelError::Config` if the file cannot be read or written.
pub fn execute_config(source: &ConfigSource) -> Result<ConfigOutput> {
    let config = source.materialize()?;
    Ok(ConfigOutput {
        path: source.path().to_path_buf(),
        config,
    })
}

/// Input for the add/remove directory tools.
#[derive(Debug, Deserialize)]
pub struct DirectoryInput {
    /// Directory to add or remove
    pub directory: PathBuf,
}

/// Output for the add/remove directory tools.
#[derive(Debug, Serialize)]
pub struct DirectoryOutput {
    /// Directory as given
    pub directory: PathBuf,
    /// What happened
    pub change: DirectoryChange,
    /// Watch list after the change
    pub watch_directories: Vec<PathBuf>,
}

/// Adds a directory to the watch list. Takes effect on the next `watch`.
///
/// # Errors
///
/// Returns `PixelError::Config` if the config cannot be read or written.
pub fn execute_add_directory(source: &ConfigSource, input: DirectoryInput) -> Result<DirectoryOutput> {
    let change = source.add_directory(&input.directory)?;
    directory_output(source, input, change)
}

/// Removes a directory from the watch list. Takes effect on the next `watch`.
///
/// # Errors
///
/// Returns `PixelError::Config` if the config cannot be read or written.
pub fn execute_remove_directory(
    source: &ConfigSource,
    input: DirectoryInput,
) -> Result<DirectoryOutput> {
    let change = source.remove_directory(&input.directory)?;
    directory_output(source, input, change)
}

fn directory_output(
    source: &ConfigSource,
    input: DirectoryInput,
    change: DirectoryChange,
) -> Result<DirectoryOutput> {
    let config = source.load()?;
    Ok(DirectoryOutput {
        directory: input.directory,
        change,
        watch_directories: config.watch_directories,
    })
}
