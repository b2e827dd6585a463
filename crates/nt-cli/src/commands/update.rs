//! Update command: write the aggregate elapsed time into the document header.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use nt_core::{NotFoundError, TrackerApi, UpdateError, UpdateOutcome};

use super::util::active_path;
use crate::host::{DocumentHost, Notice};

/// What one successful update cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateReport {
    /// The header holds `elapsed_ms`; `changed` is false when it already did.
    Updated {
        path: PathBuf,
        elapsed_ms: i64,
        changed: bool,
    },
    /// The document has no trackers and was left alone.
    NoTrackers { path: PathBuf },
}

pub(crate) fn io_error(path: &Path) -> impl Fn(io::Error) -> UpdateError + '_ {
    move |source| UpdateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Runs one read-compute-write cycle on the active document.
///
/// The document is only written when the computed text differs from what
/// was read, and never when the header cannot be parsed.
pub async fn run_update<H, Tz>(
    host: &H,
    api: &TrackerApi<Tz>,
    now: DateTime<Utc>,
) -> Result<UpdateReport, UpdateError>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let path = active_path(host)?;

    let Some(_lock) = host.try_lock(&path).map_err(io_error(&path))? else {
        return Err(UpdateError::Busy { path });
    };

    let text = host.read(&path).await.map_err(io_error(&path))?;
    let outcome = api
        .update_document(&text, now)
        .map_err(|source| UpdateError::Header {
            path: path.clone(),
            source,
        })?;

    match outcome {
        UpdateOutcome::NoTrackers => {
            tracing::debug!(path = %path.display(), "no trackers, document left alone");
            Ok(UpdateReport::NoTrackers { path })
        }
        UpdateOutcome::Updated {
            elapsed_ms,
            document,
        } => {
            let changed = document != text;
            if changed {
                host.write(&path, &document)
                    .await
                    .map_err(io_error(&path))?;
            }
            tracing::debug!(path = %path.display(), elapsed_ms, changed, "update cycle finished");
            Ok(UpdateReport::Updated {
                path,
                elapsed_ms,
                changed,
            })
        }
    }
}

/// The notification for a cycle result, if it warrants one.
///
/// Busy and I/O failures are reported as errors rather than notices.
pub fn notice<Tz>(
    api: &TrackerApi<Tz>,
    result: &Result<UpdateReport, UpdateError>,
    announce_unchanged: bool,
) -> Option<Notice>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match result {
        Ok(UpdateReport::Updated {
            elapsed_ms,
            changed,
            ..
        }) => (*changed || announce_unchanged).then(|| Notice::Updated {
            elapsed: api.format_duration(*elapsed_ms),
        }),
        Ok(UpdateReport::NoTrackers { .. })
        | Err(UpdateError::NotFound(NotFoundError::NoTrackers)) => Some(Notice::NoTrackers),
        Err(UpdateError::NotFound(NotFoundError::NoActiveDocument)) => {
            Some(Notice::NoActiveDocument)
        }
        Err(UpdateError::Header { .. }) => Some(Notice::HeaderParseError),
        Err(_) => None,
    }
}

/// Runs the update command once.
pub async fn run<H, Tz>(host: &H, api: &TrackerApi<Tz>) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let result = run_update(host, api, Utc::now()).await;
    if let Some(notice) = notice(api, &result, true) {
        host.notify(&notice);
    }
    result?;
    Ok(())
}
