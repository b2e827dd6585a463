//! Start and stop commands: open or close the running entry of a tracker.

use std::fmt;
use std::num::NonZeroUsize;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use nt_core::{Entry, NotFoundError, TrackerApi};

use super::util::edit_tracker;
use crate::host::DocumentHost;

/// Appends a running entry to tracker `number` and returns it.
pub async fn start<H, Tz>(
    host: &H,
    api: &TrackerApi<Tz>,
    number: NonZeroUsize,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Entry>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tracker = edit_tracker(host, api, number, |tracker| tracker.start(now, name)).await?;
    let entry = tracker
        .entries
        .last()
        .cloned()
        .ok_or(NotFoundError::NoRunningEntry)?;
    Ok(entry)
}

/// Closes the running entry of tracker `number` and returns it.
pub async fn stop<H, Tz>(
    host: &H,
    api: &TrackerApi<Tz>,
    number: NonZeroUsize,
    now: DateTime<Utc>,
) -> Result<Entry>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut stopped = None;
    edit_tracker(host, api, number, |tracker| {
        let index = tracker
            .entries
            .iter()
            .position(Entry::is_running)
            .ok_or(NotFoundError::NoRunningEntry)?;
        let edited = tracker.stop(now)?;
        stopped = Some(edited.entries[index].clone());
        Ok(edited)
    })
    .await?;
    Ok(stopped.ok_or(NotFoundError::NoRunningEntry)?)
}

pub async fn run_start<H, Tz>(
    host: &H,
    api: &TrackerApi<Tz>,
    number: NonZeroUsize,
    name: Option<&str>,
) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let entry = start(host, api, number, name, Utc::now()).await?;
    println!("Started at {}", api.format_timestamp(entry.start));
    Ok(())
}

pub async fn run_stop<H, Tz>(host: &H, api: &TrackerApi<Tz>, number: NonZeroUsize) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let now = Utc::now();
    let entry = stop(host, api, number, now).await?;
    println!(
        "Stopped after {}",
        api.format_duration(api.duration(&entry, now))
    );
    Ok(())
}
