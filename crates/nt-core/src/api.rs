//! Tracker operations bound to one settings snapshot and time zone.
//!
//! Each operation has a single canonical free function elsewhere in the
//! crate; [`TrackerApi`] only supplies the configured order, formats, policy
//! and zone so callers do not thread them through by hand.

use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::aggregate::{UpdateOutcome, aggregate_total, update_document};
use crate::document::{Discovery, TrackerMatch, discover_trackers};
use crate::duration;
use crate::entry::{Entry, Tracker};
use crate::error::NotFoundError;
use crate::format::{format_duration, format_timestamp, ordered_entries};
use crate::header::HeaderError;
use crate::parser::{ParseError, parse_tracker_in};
use crate::settings::Settings;

/// Read-only tracker operations with configuration pre-bound.
#[derive(Debug, Clone)]
pub struct TrackerApi<Tz: TimeZone = Local> {
    settings: Settings,
    tz: Tz,
}

impl TrackerApi<Local> {
    /// Binds `settings` to the host's local time zone.
    pub const fn local(settings: Settings) -> Self {
        Self {
            settings,
            tz: Local,
        }
    }
}

impl<Tz> TrackerApi<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub const fn new(settings: Settings, tz: Tz) -> Self {
        Self { settings, tz }
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn time_zone(&self) -> &Tz {
        &self.tz
    }

    pub fn parse(&self, text: &str) -> Result<Tracker, ParseError> {
        parse_tracker_in(text, &self.tz)
    }

    pub fn serialize(&self, tracker: &Tracker) -> String {
        tracker.to_source(&self.tz)
    }

    pub fn discover(&self, document: &str) -> Discovery {
        discover_trackers(document, &self.tz)
    }

    pub fn duration(&self, entry: &Entry, now: DateTime<Utc>) -> i64 {
        duration::duration(entry, now)
    }

    pub fn total_duration(&self, entries: &[Entry], now: DateTime<Utc>) -> i64 {
        duration::total_duration(entries, now)
    }

    pub fn duration_today(&self, entry: &Entry, now: DateTime<Utc>) -> i64 {
        duration::duration_today(entry, now, &self.tz)
    }

    pub fn total_duration_today(&self, entries: &[Entry], now: DateTime<Utc>) -> i64 {
        duration::total_duration_today(entries, now, &self.tz)
    }

    pub fn is_running(&self, entries: &[Entry]) -> bool {
        duration::is_running(entries)
    }

    pub fn running_entry<'a>(&self, entries: &'a [Entry]) -> Result<&'a Entry, NotFoundError> {
        duration::running_entry(entries)
    }

    /// Entries in the configured display order.
    pub fn ordered_entries<'a>(&self, entries: &'a [Entry]) -> Vec<&'a Entry> {
        ordered_entries(entries, self.settings.order)
    }

    pub fn format_timestamp(&self, timestamp: DateTime<Utc>) -> String {
        format_timestamp(timestamp, &self.settings.timestamp_format, &self.tz)
    }

    pub fn format_duration(&self, ms: i64) -> String {
        format_duration(ms, self.settings.duration_format)
    }

    /// Document total under the configured first-tracker policy.
    pub fn aggregate(&self, trackers: &[TrackerMatch], now: DateTime<Utc>) -> Option<i64> {
        aggregate_total(trackers, self.settings.only_first_tracker, now)
    }

    pub fn update_document(
        &self,
        document: &str,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome, HeaderError> {
        update_document(document, self.settings.only_first_tracker, now, &self.tz)
    }
}
