//! Entry ordering and text rendering of timestamps and durations.

use std::fmt::{self, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use crate::entry::Entry;
use crate::settings::{DEFAULT_TIMESTAMP_FORMAT, DurationFormat, EntryOrder};

/// Why a timestamp could not be read.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimestampError {
    #[error("text does not match the timestamp format")]
    Invalid,
    /// The wall-clock time falls in a DST gap.
    #[error("local time does not exist in this time zone")]
    Nonexistent,
}

/// Error for duration text that cannot be read back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid duration: {0:?}")]
pub struct InvalidDuration(pub String);

// ========== Ordering ==========

/// Sorts entries by start time in the given direction.
///
/// The sort is stable, so entries with equal starts keep their input order.
/// Ordering an already ordered list returns it unchanged.
pub fn ordered_entries<'a, I>(entries: I, order: EntryOrder) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut sorted: Vec<&Entry> = entries.into_iter().collect();
    match order {
        EntryOrder::Ascending => sorted.sort_by(|a, b| a.start.cmp(&b.start)),
        EntryOrder::Descending => sorted.sort_by(|a, b| b.start.cmp(&a.start)),
    }
    sorted
}

// ========== Timestamps ==========

/// Returns true if `format` is a non-empty strftime string chrono can render.
pub fn is_valid_format(format: &str) -> bool {
    !format.trim().is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Renders a timestamp in `tz` with a strftime format.
///
/// An unusable format falls back to [`DEFAULT_TIMESTAMP_FORMAT`].
pub fn format_timestamp<Tz>(timestamp: DateTime<Utc>, format: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = timestamp.with_timezone(tz);
    if is_valid_format(format) {
        let mut out = String::new();
        if write!(out, "{}", local.format(format)).is_ok() {
            return out;
        }
    }
    tracing::warn!(format, "unusable timestamp format, using default");
    local.format(DEFAULT_TIMESTAMP_FORMAT).to_string()
}

/// Reads a timestamp written by [`format_timestamp`] with the same format.
///
/// The text is taken as wall-clock time in `tz`; when a DST fall-back makes
/// it ambiguous the earlier instant wins. RFC 3339 text is accepted as well.
pub fn parse_timestamp<Tz: TimeZone>(
    text: &str,
    format: &str,
    tz: &Tz,
) -> Result<DateTime<Utc>, TimestampError> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
            LocalResult::None => Err(TimestampError::Nonexistent),
        };
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TimestampError::Invalid)
}

// ========== Durations ==========

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Formats milliseconds as a duration string.
///
/// Sub-second remainders are floored. Negative durations render as zero.
pub fn format_duration(ms: i64, format: DurationFormat) -> String {
    let ms = ms.max(0);
    match format {
        DurationFormat::Clock => {
            let hours = ms / HOUR_MS;
            let minutes = ms % HOUR_MS / MINUTE_MS;
            let seconds = ms % MINUTE_MS / SECOND_MS;
            format!("{hours:02}:{minutes:02}:{seconds:02}")
        }
        DurationFormat::Fine => {
            let units = [
                (ms / DAY_MS, 'd'),
                (ms % DAY_MS / HOUR_MS, 'h'),
                (ms % HOUR_MS / MINUTE_MS, 'm'),
                (ms % MINUTE_MS / SECOND_MS, 's'),
            ];
            let parts: Vec<String> = units
                .iter()
                .filter(|(value, _)| *value > 0)
                .map(|(value, unit)| format!("{value}{unit}"))
                .collect();
            if parts.is_empty() {
                "0s".to_string()
            } else {
                parts.join(" ")
            }
        }
        DurationFormat::Coarse => {
            let total_minutes = ms / MINUTE_MS;
            let hours = total_minutes / 60;
            let minutes = total_minutes % 60;
            if hours >= 1 {
                format!("{hours}h {minutes}m")
            } else {
                format!("{minutes}m")
            }
        }
    }
}

/// Reads a duration rendered by [`format_duration`] back into milliseconds.
///
/// Accepts `H:MM` / `H:MM:SS` and unit lists such as `1d 2h 5m 9s`.
pub fn parse_duration(text: &str) -> Result<i64, InvalidDuration> {
    let invalid = || InvalidDuration(text.to_string());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    if trimmed.contains(':') {
        let fields: Vec<i64> = trimmed
            .split(':')
            .map(|f| f.parse::<i64>().ok().filter(|v| *v >= 0))
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        let (hours, minutes, seconds) = match fields[..] {
            [h, m] => (h, m, 0),
            [h, m, s] => (h, m, s),
            _ => return Err(invalid()),
        };
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }
        return hours
            .checked_mul(HOUR_MS)
            .and_then(|total| total.checked_add(minutes * MINUTE_MS + seconds * SECOND_MS))
            .ok_or_else(invalid);
    }

    trimmed.split_whitespace().try_fold(0_i64, |total, token| {
        let unit = token.chars().last().ok_or_else(invalid)?;
        let value: i64 = token[..token.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        let scale = match unit {
            'd' => DAY_MS,
            'h' => HOUR_MS,
            'm' => MINUTE_MS,
            's' => SECOND_MS,
            _ => return Err(invalid()),
        };
        if value < 0 {
            return Err(invalid());
        }
        value
            .checked_mul(scale)
            .and_then(|ms| total.checked_add(ms))
            .ok_or_else(invalid)
    })
}
