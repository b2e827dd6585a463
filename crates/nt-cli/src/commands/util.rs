//! Shared utilities for command implementations.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::TimeZone;
use nt_core::{
    Discovery, NotFoundError, Tracker, TrackerApi, TrackerError, TrackerMatch, UpdateError,
    discover_trackers, replace_block,
};

use super::update::io_error;
use crate::host::DocumentHost;

/// The document commands operate on.
pub fn active_path<H: DocumentHost>(host: &H) -> Result<PathBuf, NotFoundError> {
    host.active_document()
        .map(Path::to_path_buf)
        .ok_or(NotFoundError::NoActiveDocument)
}

/// Reads `path` through the host and discovers its trackers.
pub async fn load_all_trackers<H, Tz>(
    host: &H,
    path: &Path,
    tz: &Tz,
) -> Result<Discovery, UpdateError>
where
    H: DocumentHost,
    Tz: TimeZone,
{
    let text = host.read(path).await.map_err(io_error(path))?;
    Ok(discover_trackers(&text, tz))
}

/// Picks a tracker by its 1-based number among the document's tracker blocks.
pub fn select_tracker(discovery: &Discovery, number: NonZeroUsize) -> Result<&TrackerMatch> {
    let index = number.get() - 1;
    if let Some(found) = discovery.trackers.iter().find(|m| m.index == index) {
        return Ok(found);
    }
    if let Some(failure) = discovery.failures.iter().find(|f| f.index == index) {
        bail!(
            "tracker {number} (line {}) cannot be parsed: {}",
            failure.line,
            failure.error
        );
    }

    let blocks = discovery.trackers.len() + discovery.failures.len();
    if blocks == 0 {
        return Err(NotFoundError::NoTrackers.into());
    }
    bail!("no tracker {number}: the document has {blocks} tracker block(s)")
}

/// Applies `edit` to one tracker and writes its block back, under the
/// document's update lock.
///
/// Returns the edited tracker.
pub async fn edit_tracker<H, Tz, F>(
    host: &H,
    api: &TrackerApi<Tz>,
    number: NonZeroUsize,
    edit: F,
) -> Result<Tracker>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
    F: FnOnce(&Tracker) -> Result<Tracker, TrackerError>,
{
    let path = active_path(host)?;
    let Some(_lock) = host.try_lock(&path).map_err(io_error(&path))? else {
        return Err(UpdateError::Busy { path }.into());
    };

    let text = host.read(&path).await.map_err(io_error(&path))?;
    let discovery = api.discover(&text);
    let found = select_tracker(&discovery, number)?;
    let edited = edit(&found.tracker)?;

    let document = replace_block(&text, found.span.clone(), &api.serialize(&edited));
    host.write(&path, &document).await.map_err(io_error(&path))?;
    tracing::debug!(path = %path.display(), tracker = number.get(), "rewrote tracker block");
    Ok(edited)
}
