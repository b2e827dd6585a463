//! Test helpers shared across modules.

use chrono::{Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

const STANDARD_SECS: i32 = 3600;
const SUMMER_SECS: i32 = 2 * 3600;

/// A zone on UTC+1 that observes summer time (UTC+2) for part of 2024.
///
/// Clocks jump from 00:00 to 01:00 local on 2024-03-10, so that midnight
/// does not exist. They fall back from 02:00 to 01:00 local on 2024-11-03,
/// so 01:00 to 02:00 that night happens twice.
#[derive(Debug, Clone, Copy)]
pub struct DstZone;

fn offset(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap()
}

fn utc_at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

impl TimeZone for DstZone {
    type Offset = FixedOffset;

    fn from_offset(_offset: &FixedOffset) -> Self {
        Self
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        let fits = |candidate: &FixedOffset| {
            let utc = *local - Duration::seconds(i64::from(candidate.local_minus_utc()));
            self.offset_from_utc_datetime(&utc) == *candidate
        };
        // Summer time first: it maps to the earlier instant.
        let mut fitting = [offset(SUMMER_SECS), offset(STANDARD_SECS)]
            .into_iter()
            .filter(fits);
        match (fitting.next(), fitting.next()) {
            (Some(earlier), Some(later)) => LocalResult::Ambiguous(earlier, later),
            (Some(only), None) => LocalResult::Single(only),
            _ => LocalResult::None,
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        if (utc_at(3, 9, 23)..utc_at(11, 3, 0)).contains(utc) {
            offset(SUMMER_SECS)
        } else {
            offset(STANDARD_SECS)
        }
    }
}
