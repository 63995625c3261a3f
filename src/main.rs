//! pixeltext: index and search text in images.
//!
//! Usage:
//!   pixeltext config                   # Write the config file with defaults
//!   pixeltext watch                    # Index image changes until Ctrl-C
//!   pixeltext search <query>           # Find images containing text
//!   pixeltext add_directory <dir>      # Add a directory to the watch list
//!   pixeltext remove_directory <dir>   # Remove a directory from the watch list

use clap::{Parser, Subcommand};
use pixeltext::config::ConfigSource;
use pixeltext::services::{IndexStore, SearchEngine, TesseractExtractor};
use pixeltext::{fmt, tools};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixeltext")]
#[command(about = "PixelText: Index and search text in images")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.pixeltext.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print command output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure PixelText settings (writes defaults for missing keys)
    Config,

    /// Start watching directories for changes
    Watch {
        /// Extraction jobs allowed to run at once
        #[arg(short, long, default_value = "4")]
        jobs: usize,

        /// Milliseconds a file change must settle before it is indexed
        #[arg(long, default_value = "500")]
        debounce_ms: u64,

        /// Path to the tesseract binary
        #[arg(long, default_value = "tesseract")]
        tesseract: PathBuf,

        /// OCR language passed to tesseract (e.g. "eng", "deu")
        #[arg(long)]
        lang: Option<String>,
    },

    /// Search for text in indexed images
    Search {
        /// Text to search for
        query: String,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Add a directory to watch
    #[command(name = "add_directory", alias = "add-directory")]
    AddDirectory {
        /// Directory to add to watch list
        directory: PathBuf,
    },

    /// Remove a directory from watch list
    #[command(name = "remove_directory", alias = "remove-directory")]
    RemoveDirectory {
        /// Directory to remove from watch list
        directory: PathBuf,
    },

    /// Show index statistics
    Stats {
        /// Show per-extension breakdown
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let source = cli
        .config
        .map(ConfigSource::new)
        .unwrap_or_else(ConfigSource::at_default_location);
    let (config, status) = source.load_with_status()?;

    // Log to stderr only; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(config.level_filter().into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();
    tracing::debug!(path = %source.path().display(), ?status, "Configuration ready");

    let color = io::stdout().is_terminal();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Config => {
            let out = tools::execute_config(&source)?;
            emit(&mut stdout, cli.json, &out, |w| fmt::fmt_config(w, &out, color))?;
        }

        Commands::Watch {
            jobs,
            debounce_ms,
            tesseract,
            lang,
        } => {
            let mut extractor = TesseractExtractor::new().with_binary(tesseract);
            if let Some(lang) = lang {
                extractor = extractor.with_language(lang);
            }
            let input = tools::WatchInput {
                max_concurrent_jobs: jobs,
                debounce_ms,
            };
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            let out = tools::execute_watch(&config, Arc::new(extractor), input, shutdown).await?;
            emit(&mut stdout, cli.json, &out, |w| fmt::fmt_watch(w, &out, color))?;
        }

        Commands::Search { query, limit } => {
            let store = Arc::new(IndexStore::open(&config.data_dir)?);
            let engine = SearchEngine::new(store);
            let input = tools::SearchInput {
                query,
                limit: limit.unwrap_or(usize::MAX),
            };
            let out = tools::execute_search(&engine, input);
            emit(&mut stdout, cli.json, &out, |w| fmt::fmt_search(w, &out, color))?;
        }

        Commands::AddDirectory { directory } => {
            let out = tools::execute_add_directory(&source, tools::DirectoryInput { directory })?;
            emit(&mut stdout, cli.json, &out, |w| fmt::fmt_directory(w, &out, color))?;
        }

        Commands::RemoveDirectory { directory } => {
            let out =
                tools::execute_remove_directory(&source, tools::DirectoryInput { directory })?;
            emit(&mut stdout, cli.json, &out, |w| fmt::fmt_directory(w, &out, color))?;
        }

        Commands::Stats { detailed } => {
            let store = IndexStore::open(&config.data_dir)?;
            let out = tools::execute_stats(&store, tools::StatsInput { detailed })?;
            emit(&mut stdout, cli.json, &out, |w| fmt::fmt_stats(w, &out, color))?;
        }
    }

    Ok(())
}

/// Writes `out` as pretty JSON or through the human formatter.
fn emit<W, T, F>(w: &mut W, json: bool, out: &T, human: F) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&mut W) -> io::Result<()>,
{
    if json {
        serde_json::to_writer_pretty(&mut *w, out)?;
        writeln!(w)?;
    } else {
        human(w)?;
    }
    Ok(())
}
