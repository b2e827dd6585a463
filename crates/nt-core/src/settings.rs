//! Display and aggregation settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default display format for timestamps (`24-03-01 10:00:00`).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%y-%m-%d %H:%M:%S";

/// Error for unrecognized setting values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {setting}: {value}")]
pub struct UnknownSettingValue {
    pub setting: &'static str,
    pub value: String,
}

/// How durations are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DurationFormat {
    /// `01:05:09`, hours are not wrapped at 24.
    #[default]
    Clock,
    /// `1d 2h 5m 9s`, zero units omitted.
    Fine,
    /// `2h 5m`, or `5m` under an hour.
    Coarse,
}

impl DurationFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Fine => "fine",
            Self::Coarse => "coarse",
        }
    }
}

impl fmt::Display for DurationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationFormat {
    type Err = UnknownSettingValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clock" => Ok(Self::Clock),
            "fine" => Ok(Self::Fine),
            "coarse" => Ok(Self::Coarse),
            _ => Err(UnknownSettingValue {
                setting: "duration format",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for DurationFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DurationFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // Lenient: a stale or misspelled option must not break loading.
        Ok(s.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default duration format");
            Self::default()
        }))
    }
}

/// Display order of entries by start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrder {
    #[default]
    Ascending,
    Descending,
}

impl EntryOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl fmt::Display for EntryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryOrder {
    type Err = UnknownSettingValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            _ => Err(UnknownSettingValue {
                setting: "entry order",
                value: s.to_string(),
            }),
        }
    }
}

/// Settings snapshot used by one operation.
///
/// Missing keys fall back to the defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// strftime format for displayed timestamps.
    pub timestamp_format: String,
    pub duration_format: DurationFormat,
    pub order: EntryOrder,
    /// Aggregate only the first tracker of a document instead of all of them.
    pub only_first_tracker: bool,
    /// Field delimiter for CSV export.
    pub csv_delimiter: String,
    /// Print today's total under each tracker.
    pub show_today: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            duration_format: DurationFormat::default(),
            order: EntryOrder::default(),
            only_first_tracker: false,
            csv_delimiter: ",".to_string(),
            show_today: true,
        }
    }
}

impl Settings {
    /// The CSV delimiter character, `,` when the setting is empty.
    pub fn csv_delimiter_char(&self) -> char {
        self.csv_delimiter.chars().next().unwrap_or(',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"only_first_tracker": true}"#).unwrap();
        assert!(settings.only_first_tracker);
        assert_eq!(settings.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(settings.duration_format, DurationFormat::Clock);
        assert_eq!(settings.order, EntryOrder::Ascending);
    }

    #[test]
    fn test_unknown_duration_format_falls_back() {
        let settings: Settings =
            serde_json::from_str(r#"{"duration_format": "sundial"}"#).unwrap();
        assert_eq!(settings.duration_format, DurationFormat::Clock);
    }

    #[test]
    fn test_duration_format_roundtrip() {
        for format in [
            DurationFormat::Clock,
            DurationFormat::Fine,
            DurationFormat::Coarse,
        ] {
            let parsed: DurationFormat = format.to_string().parse().unwrap();
            assert_eq!(parsed, format);
        }
        assert!("weekly".parse::<DurationFormat>().is_err());
    }

    #[test]
    fn test_entry_order_parse() {
        assert_eq!("desc".parse::<EntryOrder>().unwrap(), EntryOrder::Descending);
        assert_eq!(
            "ascending".parse::<EntryOrder>().unwrap(),
            EntryOrder::Ascending
        );
        let err = "sideways".parse::<EntryOrder>().unwrap_err();
        assert_eq!(err.to_string(), "unknown entry order: sideways");
    }

    #[test]
    fn test_csv_delimiter_char() {
        let mut settings = Settings::default();
        assert_eq!(settings.csv_delimiter_char(), ',');
        settings.csv_delimiter = ";".to_string();
        assert_eq!(settings.csv_delimiter_char(), ';');
        settings.csv_delimiter = String::new();
        assert_eq!(settings.csv_delimiter_char(), ',');
    }
}
