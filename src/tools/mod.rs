//! Command implementations shared by the CLI.

mod config;
mod index;
mod search;

// config
pub use config::{
    execute_add_directory, execute_config, execute_remove_directory, ConfigOutput,
    DirectoryInput, DirectoryOutput,
};

// index
pub use index::{
    execute_stats, execute_watch, IndexSize, StatsInput, StatsOutput, WatchInput, WatchOutput,
    WatchedDirectory, EVENT_QUEUE_CAPACITY,
};

// search
pub use search::{execute_search, SearchInput, SearchOutput};
