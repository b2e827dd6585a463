//! Core domain logic for note time trackers.
//!
//! This crate contains the fundamental types and logic for:
//! - Parsing: `time-tracker` blocks into entries, and back
//! - Durations: per entry, totals, and today-only totals with a running entry
//! - Display: entry ordering, timestamp/duration formatting, table export
//! - Aggregation: combining every tracker of a note and writing the total
//!   into the note's frontmatter

mod aggregate;
pub mod api;
pub mod document;
pub mod duration;
mod entry;
pub mod error;
pub mod export;
pub mod format;
pub mod header;
pub mod parser;
pub mod settings;
#[cfg(test)]
mod testing;

pub use aggregate::{UpdateOutcome, aggregate_total, update_document};
pub use api::TrackerApi;
pub use document::{BlockFailure, Discovery, TrackerMatch, discover_trackers, replace_block};
pub use entry::{Entry, Tracker};
pub use error::{NotFoundError, TrackerError, UpdateError};
pub use export::{ExportFormat, export};
pub use header::HeaderError;
pub use parser::{ParseError, parse_tracker, parse_tracker_in};
pub use settings::{DurationFormat, EntryOrder, Settings};
