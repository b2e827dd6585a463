//! Document-level totals and the elapsed-header update.

use chrono::{DateTime, TimeZone, Utc};

use crate::document::{TrackerMatch, discover_trackers};
use crate::duration::total_duration;
use crate::header::{HeaderError, set_elapsed};

/// Combines the totals of a document's trackers.
///
/// Returns `None` when there are no trackers, so callers can tell "nothing
/// tracked" apart from a zero total.
pub fn aggregate_total(
    trackers: &[TrackerMatch],
    only_first_tracker: bool,
    now: DateTime<Utc>,
) -> Option<i64> {
    if only_first_tracker {
        return trackers
            .first()
            .map(|m| total_duration(&m.tracker.entries, now));
    }
    if trackers.is_empty() {
        return None;
    }
    Some(
        trackers
            .iter()
            .map(|m| total_duration(&m.tracker.entries, now))
            .sum(),
    )
}

/// Result of computing a header update for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The document has no trackers; nothing should be written.
    NoTrackers,
    /// The new document text with the aggregate in its header.
    Updated { elapsed_ms: i64, document: String },
}

/// Computes the document text with the aggregate elapsed time in its header.
///
/// Pure text transform: the caller reads the document and writes the result
/// back. Malformed tracker blocks are skipped; a header that cannot be
/// parsed aborts the update.
pub fn update_document<Tz: TimeZone>(
    text: &str,
    only_first_tracker: bool,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<UpdateOutcome, HeaderError> {
    let discovery = discover_trackers(text, tz);
    let Some(elapsed_ms) = aggregate_total(&discovery.trackers, only_first_tracker, now) else {
        return Ok(UpdateOutcome::NoTrackers);
    };

    let document = set_elapsed(text, elapsed_ms)?;
    tracing::debug!(
        elapsed_ms,
        trackers = discovery.trackers.len(),
        skipped = discovery.failures.len(),
        "computed header update"
    );
    Ok(UpdateOutcome::Updated {
        elapsed_ms,
        document,
    })
}
