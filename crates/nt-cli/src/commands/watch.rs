//! Watch command: run the update cycle on a timer until interrupted.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use nt_core::{TrackerApi, UpdateError};
use tokio::time::{self, MissedTickBehavior};

use super::update::{notice, run_update};
use crate::host::{DocumentHost, Notice};

/// Runs update cycles every `interval` until `shutdown` resolves.
///
/// A notice is only sent when it differs from the previous one, so a
/// stopped tracker does not repeat "updated" every tick.
pub async fn watch_until<H, Tz, S>(
    host: &H,
    api: &TrackerApi<Tz>,
    interval: Duration,
    shutdown: S,
) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
    S: Future<Output = ()>,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut last: Option<Notice> = None;
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                let result = run_update(host, api, Utc::now()).await;
                if let Some(current) = notice(api, &result, false) {
                    if last.as_ref() != Some(&current) {
                        host.notify(&current);
                        last = Some(current);
                    }
                }
                match result {
                    Ok(report) => tracing::debug!(?report, "update cycle"),
                    Err(UpdateError::Busy { path }) => {
                        tracing::debug!(path = %path.display(), "update in progress, skipping tick");
                    }
                    Err(e @ UpdateError::Io { .. }) => tracing::warn!(error = %e, "update cycle failed"),
                    Err(e) => tracing::debug!(error = %e, "update cycle skipped"),
                }
            }
        }
    }

    tracing::debug!("watch stopped");
    Ok(())
}

/// Runs the watch command until Ctrl-C.
pub async fn run<H, Tz>(host: &H, api: &TrackerApi<Tz>, interval: Duration) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    tracing::debug!(?interval, "watching active document");
    watch_until(host, api, interval, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}
