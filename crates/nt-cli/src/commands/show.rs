//! Show command: print a document's trackers with entries and totals.

use std::fmt;
use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use nt_core::{Discovery, Entry, TrackerApi, TrackerMatch};
use serde::Serialize;

use super::util::{active_path, load_all_trackers};
use crate::host::DocumentHost;

#[derive(Serialize)]
struct ShowJson<'a> {
    trackers: Vec<TrackerJson<'a>>,
    failures: Vec<FailureJson>,
    elapsed_ms: Option<i64>,
}

#[derive(Serialize)]
struct TrackerJson<'a> {
    number: usize,
    line: usize,
    running: bool,
    total_ms: i64,
    today_ms: i64,
    entries: Vec<EntryJson<'a>>,
}

#[derive(Serialize)]
struct EntryJson<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    duration_ms: i64,
}

#[derive(Serialize)]
struct FailureJson {
    number: usize,
    line: usize,
    error: String,
}

fn render_entry<Tz>(api: &TrackerApi<Tz>, entry: &Entry, now: DateTime<Utc>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let end = entry
        .end
        .map_or_else(|| "running".to_string(), |end| api.format_timestamp(end));
    let mut line = format!(
        "  {} -> {}  {}",
        api.format_timestamp(entry.start),
        end,
        api.format_duration(api.duration(entry, now)),
    );
    if let Some(name) = &entry.name {
        line.push_str("  ");
        line.push_str(name);
    }
    line
}

fn render_tracker<W, Tz>(
    out: &mut W,
    api: &TrackerApi<Tz>,
    found: &TrackerMatch,
    now: DateTime<Utc>,
) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let entries = &found.tracker.entries;
    let running = if api.is_running(entries) {
        " [running]"
    } else {
        ""
    };
    writeln!(
        out,
        "Tracker {} (line {}){running}",
        found.index + 1,
        found.line
    )?;
    for entry in api.ordered_entries(entries) {
        writeln!(out, "{}", render_entry(api, entry, now))?;
    }
    writeln!(
        out,
        "  Total: {}",
        api.format_duration(api.total_duration(entries, now))
    )?;
    if api.settings().show_today {
        writeln!(
            out,
            "  Today: {}",
            api.format_duration(api.total_duration_today(entries, now))
        )?;
    }
    Ok(())
}

/// Writes the text view of a document's trackers.
pub fn render<W, Tz>(
    out: &mut W,
    api: &TrackerApi<Tz>,
    discovery: &Discovery,
    now: DateTime<Utc>,
) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if discovery.trackers.is_empty() && discovery.failures.is_empty() {
        writeln!(out, "No trackers found")?;
        return Ok(());
    }

    for (i, found) in discovery.trackers.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        render_tracker(out, api, found, now)?;
    }

    if !discovery.failures.is_empty() {
        writeln!(out)?;
    }
    for failure in &discovery.failures {
        writeln!(
            out,
            "Skipped block {} (line {}): {}",
            failure.index + 1,
            failure.line,
            failure.error
        )?;
    }

    if let Some(elapsed) = api.aggregate(&discovery.trackers, now) {
        writeln!(out)?;
        writeln!(out, "Elapsed: {}", api.format_duration(elapsed))?;
    }
    Ok(())
}

/// Writes the JSON view of a document's trackers.
pub fn render_json<W, Tz>(
    out: &mut W,
    api: &TrackerApi<Tz>,
    discovery: &Discovery,
    now: DateTime<Utc>,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let view = ShowJson {
        trackers: discovery
            .trackers
            .iter()
            .map(|found| {
                let entries = &found.tracker.entries;
                TrackerJson {
                    number: found.index + 1,
                    line: found.line,
                    running: api.is_running(entries),
                    total_ms: api.total_duration(entries, now),
                    today_ms: api.total_duration_today(entries, now),
                    entries: api
                        .ordered_entries(entries)
                        .into_iter()
                        .map(|entry| EntryJson {
                            entry,
                            duration_ms: api.duration(entry, now),
                        })
                        .collect(),
                }
            })
            .collect(),
        failures: discovery
            .failures
            .iter()
            .map(|failure| FailureJson {
                number: failure.index + 1,
                line: failure.line,
                error: failure.error.to_string(),
            })
            .collect(),
        elapsed_ms: api.aggregate(&discovery.trackers, now),
    };
    serde_json::to_writer_pretty(&mut *out, &view)?;
    writeln!(out)?;
    Ok(())
}

/// Runs the show command against the active document.
pub async fn run<H, Tz>(host: &H, api: &TrackerApi<Tz>, json: bool) -> Result<()>
where
    H: DocumentHost,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let path = active_path(host)?;
    let discovery = load_all_trackers(host, &path, api.time_zone()).await?;
    tracing::debug!(
        path = %path.display(),
        trackers = discovery.trackers.len(),
        "loaded document"
    );

    let now = Utc::now();
    let mut stdout = io::stdout().lock();
    if json {
        render_json(&mut stdout, api, &discovery, now)?;
    } else {
        render(&mut stdout, api, &discovery, now)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use nt_core::{DurationFormat, EntryOrder, Settings};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 10, 15, 0).unwrap()
    }

    const DOCUMENT: &str = "\
---
title: Sprint
---
```time-tracker
2024-03-02 09:00:00 -> 2024-03-02 09:30:00 | Standup
2024-03-01 23:00:00 -> 2024-03-02 01:00:00 | Deploy
2024-03-02 10:00:00 ->
```

```time-tracker
oops
```

```time-tracker
2024-03-01 14:00:00 -> 2024-03-01 14:45:00
```
";

    fn show(settings: Settings) -> String {
        let api = TrackerApi::new(settings, Utc);
        let discovery = api.discover(DOCUMENT);
        let mut out = Vec::new();
        render(&mut out, &api, &discovery, now()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_show_text() {
        assert_snapshot!(show(Settings::default()), @r#"
        Tracker 1 (line 4) [running]
          24-03-01 23:00:00 -> 24-03-02 01:00:00  02:00:00  Deploy
          24-03-02 09:00:00 -> 24-03-02 09:30:00  00:30:00  Standup
          24-03-02 10:00:00 -> running  00:15:00
          Total: 02:45:00
          Today: 01:45:00

        Tracker 3 (line 14)
          24-03-01 14:00:00 -> 24-03-01 14:45:00  00:45:00
          Total: 00:45:00
          Today: 00:00:00

        Skipped block 2 (line 10): line 1: expected `<start> -> [<end>]`, got "oops"

        Elapsed: 03:30:00
        "#);
    }

    #[test]
    fn test_show_text_respects_settings() {
        let settings = Settings {
            timestamp_format: "%H:%M".to_string(),
            duration_format: DurationFormat::Coarse,
            order: EntryOrder::Descending,
            only_first_tracker: true,
            show_today: false,
            ..Settings::default()
        };
        let text = show(settings);
        assert!(text.starts_with(
            "Tracker 1 (line 4) [running]\n  10:00 -> running  15m\n  09:00 -> 09:30  30m  Standup\n"
        ));
        assert!(!text.contains("Today:"));
        assert!(text.ends_with("Elapsed: 2h 45m\n"));
    }

    #[test]
    fn test_show_without_trackers() {
        let api = TrackerApi::new(Settings::default(), Utc);
        let mut out = Vec::new();
        render(&mut out, &api, &api.discover("plain text\n"), now()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No trackers found\n");
    }

    #[test]
    fn test_show_json() {
        let api = TrackerApi::new(Settings::default(), Utc);
        let discovery = api.discover(DOCUMENT);
        let mut out = Vec::new();
        render_json(&mut out, &api, &discovery, now()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["elapsed_ms"], 12_600_000);
        assert_eq!(value["trackers"][0]["running"], true);
        assert_eq!(value["trackers"][0]["today_ms"], 6_300_000);
        assert_eq!(value["trackers"][0]["entries"][0]["name"], "Deploy");
        assert_eq!(
            value["trackers"][0]["entries"][2]["start"],
            "2024-03-02T10:00:00Z"
        );
        assert!(value["trackers"][0]["entries"][2].get("end").is_none());
        assert_eq!(value["trackers"][1]["number"], 3);
        assert_eq!(value["failures"][0]["number"], 2);
    }
}
