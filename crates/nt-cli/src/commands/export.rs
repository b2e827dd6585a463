//! Export command: print entries as a CSV or Markdown table.

use std::fmt;
use std::io::{self, Write};
use std::num::NonZeroUsize;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use nt_core::{Discovery, Entry, ExportFormat, NotFoundError, TrackerApi, export};

use super::util::{active_path, load_all_trackers, select_tracker};
use crate::host::DocumentHost;

/// Renders the entries of one tracker, or of all trackers when `tracker` is `None`.
pub fn render<Tz>(
    api: &TrackerApi<Tz>,
    discovery: &Discovery,
    format: ExportFormat,
    tracker: Option<NonZeroUsize>,
    now: DateTime<Utc>,
) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let entries: Vec<Entry> = match tracker {
        Some(number) => select_tracker(discovery, number)?.tracker.entries.clone(),
        None => {
            if discovery.trackers.is_empty() {
                return Err(NotFoundError::NoTrackers.into());
            }
            discovery
                .trackers
                .iter()
                .flat_map(|m| m.tracker.entries.iter().cloned())
                .collect()
        }
    };
    Ok(export(api, &entries, format, now))
}

/// Runs the export command against the active document.
pub async fn run<H, Tz>(
    host: &H,
    api: &TrackerApi<Tz>,
    format: ExportFormat,
    tracker: Option<NonZeroUsize>,
) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let path = active_path(host)?;
    let discovery = load_all_trackers(host, &path, api.time_zone()).await?;
    let table = render(api, &discovery, format, tracker, Utc::now())?;
    io::stdout().lock().write_all(table.as_bytes())?;
    Ok(())
}
