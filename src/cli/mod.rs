//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// Tasklist - a small persistent to-do list.
///
/// Ids can be given in full or as any unique prefix.
#[derive(Parser, Debug)]
#[command(name = "tasklist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: markdown, json, or table.
    #[arg(short, long, default_value = "markdown", global = true)]
    pub format: String,

    /// Override the data directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the simulated store latency in milliseconds.
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all todos.
    List,

    /// Add a new todo.
    Add {
        /// Todo text.
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Toggle a todo between done and not done.
    Toggle {
        /// Todo ID (full or prefix).
        id: String,
    },

    /// Delete a todo.
    Delete {
        /// Todo ID (full or prefix).
        id: String,
    },

    /// Change the text of a todo.
    Edit {
        /// Todo ID (full or prefix).
        id: String,

        /// New todo text.
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Show a single todo in detail.
    Show {
        /// Todo ID (full or prefix).
        id: String,
    },

    /// Remove every todo from the store.
    Clear {
        /// Skip the confirmation check.
        #[arg(long)]
        yes: bool,
    },

    /// Show configuration and storage paths, optionally changing settings.
    Config {
        /// Persist a new simulated latency in milliseconds.
        #[arg(long)]
        set_delay_ms: Option<u64>,

        /// Persist a storage backend: sqlite or memory.
        #[arg(long)]
        set_backend: Option<String>,
    },
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}

/// Join words into a title, trimming surrounding whitespace.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_title(words: &[String]) -> Option<String> {
    let title = words.join(" ");
    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
