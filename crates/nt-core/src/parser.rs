//! Tracker block parsing and serialization.
//!
//! A tracker block holds one record per line:
//!
//! ```text
//! # comments start with `#` or `//`
//! @format %d.%m.%Y %H:%M:%S
//! 01.03.2024 10:00:00 -> 01.03.2024 10:30:00 | Writing
//! 01.03.2024 11:00:00 ->
//! ```
//!
//! A record is `<start> -> [<end>] [| <name>]`; an empty end marks the
//! running entry. Timestamps use the `@format` directive (default
//! [`DEFAULT_RECORD_FORMAT`]) and are read as wall-clock time in the
//! supplied time zone. A malformed record fails the whole block: dropping
//! it would silently corrupt the totals.

use std::fmt::{self, Write};

use chrono::{Local, TimeZone};
use thiserror::Error;

use crate::entry::{Entry, Tracker};
use crate::format::{TimestampError, format_timestamp, is_valid_format, parse_timestamp};

/// Record timestamp format used when a block declares none.
pub const DEFAULT_RECORD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SEPARATOR: &str = "->";
const NAME_SEPARATOR: char = '|';
const FORMAT_DIRECTIVE: &str = "format";

/// Structural errors in tracker source. Line numbers are 1-based within the block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected `<start> -> [<end>]`, got {text:?}")]
    MissingSeparator { line: usize, text: String },

    #[error("line {line}: {text:?} does not match timestamp format {format:?}")]
    InvalidTimestamp {
        line: usize,
        text: String,
        format: String,
    },

    #[error("line {line}: local time {text:?} does not exist in this time zone")]
    NonexistentLocalTime { line: usize, text: String },

    #[error("line {line}: entry ends before it starts")]
    EndBeforeStart { line: usize },

    #[error("line {line}: second running entry (the first is on line {first})")]
    MultipleRunning { line: usize, first: usize },

    #[error("line {line}: invalid record format {format:?}")]
    InvalidFormat { line: usize, format: String },

    #[error("line {line}: unknown directive @{name}")]
    UnknownDirective { line: usize, name: String },
}

impl ParseError {
    /// The 1-based line within the block where parsing stopped.
    pub const fn line(&self) -> usize {
        match self {
            Self::MissingSeparator { line, .. }
            | Self::InvalidTimestamp { line, .. }
            | Self::NonexistentLocalTime { line, .. }
            | Self::EndBeforeStart { line }
            | Self::MultipleRunning { line, .. }
            | Self::InvalidFormat { line, .. }
            | Self::UnknownDirective { line, .. } => *line,
        }
    }
}

/// Parses a tracker block, reading timestamps in the local time zone.
pub fn parse_tracker(text: &str) -> Result<Tracker, ParseError> {
    parse_tracker_in(text, &Local)
}

/// Parses a tracker block, reading timestamps in `tz`.
pub fn parse_tracker_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<Tracker, ParseError> {
    let mut tracker = Tracker::default();
    let mut running_line: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') || content.starts_with("//") {
            continue;
        }

        if let Some(directive) = content.strip_prefix('@') {
            apply_directive(&mut tracker, directive, line)?;
            continue;
        }

        let entry = parse_record(content, tracker.record_format(), tz, line)?;
        if entry.is_running() {
            if let Some(first) = running_line {
                return Err(ParseError::MultipleRunning { line, first });
            }
            running_line = Some(line);
        }
        tracker.entries.push(entry);
    }

    tracing::trace!(entries = tracker.entries.len(), "parsed tracker block");
    Ok(tracker)
}

fn apply_directive(tracker: &mut Tracker, directive: &str, line: usize) -> Result<(), ParseError> {
    let (name, value) = directive
        .split_once(char::is_whitespace)
        .map_or((directive, ""), |(n, v)| (n, v.trim()));

    if name != FORMAT_DIRECTIVE {
        return Err(ParseError::UnknownDirective {
            line,
            name: name.to_string(),
        });
    }
    // Records must not be able to contain the separators or open like a
    // comment or directive line.
    if !is_valid_format(value)
        || value.contains(SEPARATOR)
        || value.contains(NAME_SEPARATOR)
        || ["#", "//", "@"].iter().any(|prefix| value.starts_with(prefix))
    {
        return Err(ParseError::InvalidFormat {
            line,
            format: value.to_string(),
        });
    }
    tracker.format = Some(value.to_string());
    Ok(())
}

fn parse_record<Tz: TimeZone>(
    content: &str,
    format: &str,
    tz: &Tz,
    line: usize,
) -> Result<Entry, ParseError> {
    let (times, name) = match content.split_once(NAME_SEPARATOR) {
        Some((times, name)) => (times, Some(name.trim()).filter(|n| !n.is_empty())),
        None => (content, None),
    };

    let Some((start_text, end_text)) = times.split_once(SEPARATOR) else {
        return Err(ParseError::MissingSeparator {
            line,
            text: content.to_string(),
        });
    };

    let start = read_timestamp(start_text, format, tz, line)?;
    let end = match end_text.trim() {
        "" => None,
        text => Some(read_timestamp(text, format, tz, line)?),
    };

    if end.is_some_and(|end| end < start) {
        return Err(ParseError::EndBeforeStart { line });
    }

    Ok(Entry {
        start,
        end,
        name: name.map(String::from),
    })
}

fn read_timestamp<Tz: TimeZone>(
    text: &str,
    format: &str,
    tz: &Tz,
    line: usize,
) -> Result<chrono::DateTime<chrono::Utc>, ParseError> {
    parse_timestamp(text, format, tz).map_err(|err| match err {
        TimestampError::Invalid => ParseError::InvalidTimestamp {
            line,
            text: text.trim().to_string(),
            format: format.to_string(),
        },
        TimestampError::Nonexistent => ParseError::NonexistentLocalTime {
            line,
            text: text.trim().to_string(),
        },
    })
}

impl Tracker {
    /// Serializes the tracker back into block source, one record per line.
    ///
    /// Parsing the output in the same time zone yields an equal tracker, at
    /// the precision of the record format.
    pub fn to_source<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let format = self.record_format();
        let mut out = String::new();
        if let Some(declared) = &self.format {
            let _ = writeln!(out, "@{FORMAT_DIRECTIVE} {declared}");
        }
        for entry in &self.entries {
            out.push_str(&format_timestamp(entry.start, format, tz));
            out.push(' ');
            out.push_str(SEPARATOR);
            if let Some(end) = entry.end {
                out.push(' ');
                out.push_str(&format_timestamp(end, format, tz));
            }
            if let Some(name) = &entry.name {
                let _ = write!(out, " {NAME_SEPARATOR} {name}");
            }
            out.push('\n');
        }
        out
    }
}
