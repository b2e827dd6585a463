//! CSV and Markdown table export of tracker entries.

use std::fmt::{self, Write};

use chrono::{DateTime, TimeZone, Utc};

use crate::api::TrackerApi;
use crate::entry::Entry;

/// Table flavour for [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Markdown,
}

const HEADERS: [&str; 4] = ["Name", "Start", "End", "Duration"];

/// Renders entries as a table in display order.
///
/// Running entries have an empty end and a duration up to `now`.
pub fn export<Tz>(
    api: &TrackerApi<Tz>,
    entries: &[Entry],
    format: ExportFormat,
    now: DateTime<Utc>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let rows: Vec<[String; 4]> = api
        .ordered_entries(entries)
        .into_iter()
        .map(|entry| {
            [
                entry.name.clone().unwrap_or_default(),
                api.format_timestamp(entry.start),
                entry
                    .end
                    .map(|end| api.format_timestamp(end))
                    .unwrap_or_default(),
                api.format_duration(api.duration(entry, now)),
            ]
        })
        .collect();

    match format {
        ExportFormat::Csv => to_csv(&rows, api.settings().csv_delimiter_char()),
        ExportFormat::Markdown => to_markdown(&rows),
    }
}

fn to_csv(rows: &[[String; 4]], delimiter: char) -> String {
    let mut out = csv_line(&HEADERS, delimiter);
    for row in rows {
        out.push_str(&csv_line(row, delimiter));
    }
    out
}

fn csv_line<S: AsRef<str>>(fields: &[S], delimiter: char) -> String {
    let separator = delimiter.to_string();
    let mut line = fields
        .iter()
        .map(|f| csv_field(f.as_ref(), delimiter))
        .collect::<Vec<_>>()
        .join(separator.as_str());
    line.push('\n');
    line
}

fn csv_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains(['"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn to_markdown(rows: &[[String; 4]]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "| {} |", HEADERS.join(" | "));
    out.push_str("| --- | --- | --- | --- |\n");
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    }
    out
}
