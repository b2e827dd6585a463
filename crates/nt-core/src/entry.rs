//! Tracked intervals and the trackers that hold them.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotFoundError, TrackerError};
use crate::parser::DEFAULT_RECORD_FORMAT;

/// One tracked interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// When the interval started.
    pub start: DateTime<Utc>,
    /// When the interval ended. `None` while the entry is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Optional label shown next to the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Entry {
    /// Creates a closed entry.
    pub const fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
            name: None,
        }
    }

    /// Creates an entry that is still running.
    pub const fn running(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub const fn is_running(&self) -> bool {
        self.end.is_none()
    }
}

/// The entries of one tracker block, in source order.
///
/// Trackers are rebuilt from the block text on every pass; the text is the
/// only source of truth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracker {
    pub entries: Vec<Entry>,
    /// Record timestamp format declared with `@format`.
    pub format: Option<String>,
}

impl Tracker {
    pub const fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            format: None,
        }
    }

    /// The strftime format used for this tracker's records.
    pub fn record_format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_RECORD_FORMAT)
    }

    /// Returns a copy of this tracker with a new entry running from `now`.
    pub fn start(&self, now: DateTime<Utc>, name: Option<&str>) -> Result<Self, TrackerError> {
        if let Some(running) = self.entries.iter().find(|e| e.is_running()) {
            return Err(TrackerError::AlreadyRunning {
                since: running.start,
            });
        }

        let mut entry = Entry::running(now.trunc_subsecs(0));
        // Records are single-line, so labels cannot carry line breaks.
        entry.name = name
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|n| !n.is_empty());

        let mut next = self.clone();
        next.entries.push(entry);
        Ok(next)
    }

    /// Returns a copy of this tracker with the running entry closed at `now`.
    ///
    /// An end before the entry's start is clamped to the start.
    pub fn stop(&self, now: DateTime<Utc>) -> Result<Self, TrackerError> {
        let index = self
            .entries
            .iter()
            .position(Entry::is_running)
            .ok_or(NotFoundError::NoRunningEntry)?;

        let mut next = self.clone();
        let entry = &mut next.entries[index];
        entry.end = Some(now.trunc_subsecs(0).max(entry.start));
        Ok(next)
    }
}
