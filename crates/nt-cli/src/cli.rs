//! Command-line argument definitions.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use nt_core::ExportFormat;

/// Time tracking inside Markdown notes.
///
/// Reads `time-tracker` code blocks from a note, shows and edits their
/// entries, and keeps the note's total in its `elapsed` frontmatter key.
#[derive(Debug, Parser)]
#[command(name = "nt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Document to operate on instead of the configured active document.
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the document's trackers, their entries and totals.
    Show {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Write the aggregate elapsed time into the document header.
    Update,

    /// Start a running entry.
    Start {
        /// Label for the new entry.
        #[arg(short, long)]
        name: Option<String>,

        /// Tracker number as printed by `show`.
        #[arg(short, long, default_value = "1")]
        tracker: NonZeroUsize,
    },

    /// Stop the running entry.
    Stop {
        /// Tracker number as printed by `show`.
        #[arg(short, long, default_value = "1")]
        tracker: NonZeroUsize,
    },

    /// Export entries as a table.
    Export {
        /// Output format.
        #[arg(long, value_enum, default_value_t = ExportArg::Csv)]
        format: ExportArg,

        /// Only export this tracker (all trackers when omitted).
        #[arg(short, long)]
        tracker: Option<NonZeroUsize>,
    },

    /// Periodically update the document header until interrupted.
    Watch {
        /// Seconds between updates (defaults to `watch_interval_secs`).
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show or edit configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Table formats accepted by `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportArg {
    Csv,
    #[value(alias = "md")]
    Markdown,
}

impl From<ExportArg> for ExportFormat {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Csv => Self::Csv,
            ExportArg::Markdown => Self::Markdown,
        }
    }
}

/// Actions for `nt config`.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,

    /// Validate and persist one setting, e.g. `tracker.order descending`.
    Set { key: String, value: String },

    /// Print the path of the config file.
    Path,
}
