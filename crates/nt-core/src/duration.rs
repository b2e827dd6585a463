//! Elapsed-time computation over entries.
//!
//! Every function takes the reference instant `now` from the caller, so a
//! tracker evaluates the same way every time it is replayed. Durations are
//! whole milliseconds and never negative.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::entry::Entry;
use crate::error::NotFoundError;

/// Elapsed time of one entry. A running entry counts up to `now`.
///
/// A `now` before the start (clock skew) yields zero.
pub fn duration(entry: &Entry, now: DateTime<Utc>) -> i64 {
    let end = entry.end.unwrap_or(now);
    (end - entry.start).num_milliseconds().max(0)
}

/// Sum of [`duration`] over all entries.
pub fn total_duration(entries: &[Entry], now: DateTime<Utc>) -> i64 {
    entries.iter().map(|e| duration(e, now)).sum()
}

/// Elapsed time of one entry within the local calendar day containing `now`.
///
/// The day is the half-open interval from midnight to the next midnight in
/// `tz`; an interval crossing midnight only contributes its part inside it.
pub fn duration_today<Tz: TimeZone>(entry: &Entry, now: DateTime<Utc>, tz: &Tz) -> i64 {
    let (day_start, day_end) = day_boundaries(now, tz);
    clipped(entry, now, day_start, day_end)
}

/// Sum of [`duration_today`] over all entries.
pub fn total_duration_today<Tz: TimeZone>(entries: &[Entry], now: DateTime<Utc>, tz: &Tz) -> i64 {
    let (day_start, day_end) = day_boundaries(now, tz);
    entries
        .iter()
        .map(|e| clipped(e, now, day_start, day_end))
        .sum()
}

/// True if exactly one entry is running.
pub fn is_running(entries: &[Entry]) -> bool {
    entries.iter().filter(|e| e.is_running()).count() == 1
}

/// The running entry, if any.
pub fn running_entry(entries: &[Entry]) -> Result<&Entry, NotFoundError> {
    entries
        .iter()
        .find(|e| e.is_running())
        .ok_or(NotFoundError::NoRunningEntry)
}

fn clipped(
    entry: &Entry,
    now: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> i64 {
    let start = entry.start.max(window_start);
    let end = entry.end.unwrap_or(now).min(window_end);
    (end - start).num_milliseconds().max(0)
}

/// Calculates the boundaries of the local day containing `now` as a half-open interval.
fn day_boundaries<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(tz).date_naive();
    let start = local_midnight_to_utc(today, tz);
    let end = today
        .succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |tomorrow| {
            local_midnight_to_utc(tomorrow, tz)
        });
    (start, end)
}

/// Converts a local date at midnight to UTC.
///
/// DST ambiguity picks the earlier instant. A midnight inside a DST gap moves
/// to the first quarter hour that exists.
fn local_midnight_to_utc<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut candidate = midnight;
    // Real-world gaps are at most a few hours long.
    for _ in 0..=16 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.with_timezone(&Utc);
            }
            LocalResult::None => candidate += Duration::minutes(15),
        }
    }
    Utc.from_utc_datetime(&midnight)
}
