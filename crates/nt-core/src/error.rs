//! Error types shared across tracker operations.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::header::HeaderError;

/// Something an operation needed was not there.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundError {
    /// No document is selected for the update.
    #[error("no active document")]
    NoActiveDocument,
    /// The document contains no tracker blocks.
    #[error("no trackers found")]
    NoTrackers,
    /// None of the entries is running.
    #[error("no running entry")]
    NoRunningEntry,
}

/// Errors from start/stop transitions on a tracker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// A tracker holds at most one running entry.
    #[error("an entry is already running since {since}")]
    AlreadyRunning { since: DateTime<Utc> },
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

/// Errors from one read-compute-write update cycle.
///
/// Every variant is raised before the document is written, so a failed
/// cycle leaves the document untouched.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    /// The existing frontmatter could not be trusted.
    #[error("{}: header parse error: {source}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },
    /// Another update cycle holds the document.
    #[error("{}: an update is already in progress", path.display())]
    Busy { path: PathBuf },
    /// Reading or writing the document failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
