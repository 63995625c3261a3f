//! Human-friendly CLI output formatters.
//!
//! Each `fmt_*` function formats one command's output for terminal display.
//! When `color` is true, ANSI escape codes are emitted via `owo_colors`.

use crate::config::DirectoryChange;
use crate::tools::{ConfigOutput, DirectoryOutput, SearchOutput, StatsOutput, WatchOutput};
use crate::types::WatchState;
use owo_colors::OwoColorize;
use std::io::{self, Write};

// ── search ──────────────────────────────────────────────────────────────────

pub fn fmt_search(w: &mut impl Write, out: &SearchOutput, color: bool) -> io::Result<()> {
    if out.results.is_empty() {
        writeln!(w, "No results found.")?;
        return Ok(());
    }

    if color {
        writeln!(w, "{}", "Results:".bold())?;
    } else {
        writeln!(w, "Results:")?;
    }
    for path in &out.results {
        writeln!(w, "{path}")?;
    }

    if out.has_more {
        if color {
            writeln!(w, "{}", "... more results available".dimmed())?;
        } else {
            writeln!(w, "... more results available")?;
        }
    }

    Ok(())
}

// ── config ──────────────────────────────────────────────────────────────────

pub fn fmt_config(w: &mut impl Write, out: &ConfigOutput, color: bool) -> io::Result<()> {
    writeln!(w, "Configuration initialized/updated.")?;
    if color {
        writeln!(w, "{:<20} {}", "Config file:".bold(), out.path.display())?;
        writeln!(w, "{:<20} {}", "Data directory:".bold(), out.config.data_dir.display())?;
    } else {
        writeln!(w, "{:<20} {}", "Config file:", out.path.display())?;
        writeln!(w, "{:<20} {}", "Data directory:", out.config.data_dir.display())?;
    }
    writeln!(w, "{:<20} {}", "Extensions:", out.config.valid_extensions.join(" "))?;
    writeln!(w, "{:<20} {}", "Log level:", out.config.log_level)?;
    for dir in &out.config.watch_directories {
        writeln!(w, "  watching {}", dir.display())?;
    }
    Ok(())
}

// ── add_directory / remove_directory ────────────────────────────────────────

pub fn fmt_directory(w: &mut impl Write, out: &DirectoryOutput, color: bool) -> io::Result<()> {
    let dir = out.directory.display();
    let message = match out.change {
        DirectoryChange::Added => format!("Added directory {dir} to watch list."),
        DirectoryChange::AlreadyPresent => {
            format!("Directory {dir} is already in the watch list.")
        }
        DirectoryChange::Removed => format!("Removed directory {dir} from watch list."),
        DirectoryChange::NotPresent => format!("Directory {dir} is not in the watch list."),
    };

    let changed = matches!(
        out.change,
        DirectoryChange::Added | DirectoryChange::Removed
    );
    if color && changed {
        writeln!(w, "{}", message.green())?;
    } else if color {
        writeln!(w, "{}", message.yellow())?;
    } else {
        writeln!(w, "{message}")?;
    }
    Ok(())
}

// ── watch ───────────────────────────────────────────────────────────────────

pub fn fmt_watch(w: &mut impl Write, out: &WatchOutput, color: bool) -> io::Result<()> {
    for dir in &out.directories {
        let state = match dir.state {
            WatchState::Active => "active",
            WatchState::Missing => "missing",
        };
        if color && dir.state == WatchState::Missing {
            writeln!(w, "  {:<8} {}", state.red(), dir.path.display())?;
        } else {
            writeln!(w, "  {:<8} {}", state, dir.path.display())?;
        }
    }

    let s = &out.stats;
    writeln!(
        w,
        "{} events: {} indexed, {} removed, {} without text, {} failed",
        s.events, s.indexed, s.removed, s.no_text, s.failed
    )?;
    Ok(())
}

// ── stats ───────────────────────────────────────────────────────────────────

pub fn fmt_stats(w: &mut impl Write, out: &StatsOutput, color: bool) -> io::Result<()> {
    if color {
        writeln!(w, "{:<16} {}", "Images:".bold(), out.total_files)?;
        writeln!(w, "{:<16} {}", "Index file:".bold(), out.index_path.display())?;
        writeln!(
            w,
            "{:<16} {} ({})",
            "Index size:".bold(),
            out.index_size.human,
            out.index_size.bytes
        )?;
    } else {
        writeln!(w, "{:<16} {}", "Images:", out.total_files)?;
        writeln!(w, "{:<16} {}", "Index file:", out.index_path.display())?;
        writeln!(
            w,
            "{:<16} {} ({})",
            "Index size:", out.index_size.human, out.index_size.bytes
        )?;
    }

    if let Some(by_type) = &out.by_type {
        writeln!(w)?;
        if color {
            writeln!(w, "{}", "By file type:".bold())?;
        } else {
            writeln!(w, "By file type:")?;
        }

        let mut types: Vec<_> = by_type.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1));
        for (ext, count) in types {
            writeln!(w, "  .{ext:<12} {count}")?;
        }
    }

    Ok(())
}
