//! Configuration loading and management.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use nt_core::format::is_valid_format;
use nt_core::{DurationFormat, EntryOrder, Settings};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Document used when no `--file` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_document: Option<PathBuf>,

    /// Seconds between update cycles in `nt watch`.
    pub watch_interval_secs: u64,

    /// Display and aggregation settings.
    pub tracker: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_document: None,
            watch_interval_secs: 60,
            tracker: Settings::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `config_path`,
    /// then `NT_*` environment variables (`NT_TRACKER__ORDER=descending`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(default_config_file().as_deref(), config_path).extract()
    }

    /// The provider stack behind [`Config::load_from`], with the user config
    /// file passed in.
    fn figment(user_file: Option<&Path>, config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = user_file {
            figment = figment.merge(Toml::file(path));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("NT_").split("__"))
    }
}

/// Returns the platform-specific config directory for nt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("nt"))
}

/// Returns the config file that `nt config set` writes by default.
pub fn default_config_file() -> Option<PathBuf> {
    dirs_config_path().map(|p| p.join("config.toml"))
}

/// Keys accepted by [`set_value`].
pub const SETTABLE_KEYS: &[&str] = &[
    "active_document",
    "watch_interval_secs",
    "tracker.timestamp_format",
    "tracker.duration_format",
    "tracker.order",
    "tracker.only_first_tracker",
    "tracker.csv_delimiter",
    "tracker.show_today",
];

/// Validates a single setting and converts it to its TOML representation.
fn parse_setting(key: &str, value: &str) -> Result<toml::Value> {
    let parsed = match key {
        "active_document" => toml::Value::String(value.to_string()),
        "watch_interval_secs" => {
            let secs: u32 = value
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
            if secs == 0 {
                bail!("{key} must be at least 1");
            }
            toml::Value::Integer(i64::from(secs))
        }
        "tracker.timestamp_format" => {
            if !is_valid_format(value) {
                bail!("invalid strftime format: {value:?}");
            }
            toml::Value::String(value.to_string())
        }
        "tracker.duration_format" => {
            toml::Value::String(value.parse::<DurationFormat>()?.as_str().to_string())
        }
        "tracker.order" => toml::Value::String(value.parse::<EntryOrder>()?.as_str().to_string()),
        "tracker.only_first_tracker" | "tracker.show_today" => toml::Value::Boolean(
            value
                .parse()
                .with_context(|| format!("{key} must be true or false"))?,
        ),
        "tracker.csv_delimiter" => {
            if value.chars().count() != 1 {
                bail!("{key} must be a single character");
            }
            toml::Value::String(value.to_string())
        }
        _ => bail!(
            "unknown setting: {key} (expected one of: {})",
            SETTABLE_KEYS.join(", ")
        ),
    };
    Ok(parsed)
}

/// Sets one key in the config file at `path`, creating the file if needed.
///
/// Other keys in the file are kept.
pub fn set_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let parsed = parse_setting(key, value)?;

    let mut table: toml::Table = match fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let mut section = &mut table;
    let mut parts: Vec<&str> = key.split('.').collect();
    let field = parts.pop().unwrap_or(key);
    for part in parts {
        let entry = section
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let Some(next) = entry.as_table_mut() else {
            bail!("{part} in {} is not a table", path.display());
        };
        section = next;
    }
    section.insert(field.to_string(), parsed);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    let content = toml::to_string_pretty(&table).context("failed to serialize config")?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(key, value, path = %path.display(), "persisted setting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use figment::Jail;

    #[test]
    fn test_default_config_file_name() {
        let path = default_config_file().unwrap();
        assert_eq!(path.file_name().unwrap(), "config.toml");
        assert_eq!(path.parent().unwrap().file_name().unwrap(), "nt");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.watch_interval_secs, 60);
        assert_eq!(config.active_document, None);
        assert_eq!(config.tracker, Settings::default());
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                "watch_interval_secs = 5\n[tracker]\norder = \"descending\"\n",
            )?;

            let config: Config = Config::figment(None, Some(Path::new("config.toml"))).extract()?;
            assert_eq!(config.watch_interval_secs, 5);
            assert_eq!(config.tracker.order, EntryOrder::Descending);
            // Keys absent from the file keep their defaults.
            assert_eq!(config.tracker.timestamp_format, Settings::default().timestamp_format);
            Ok(())
        });
    }

    #[test]
    fn test_load_layer_precedence() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("user.toml", "watch_interval_secs = 5\n[tracker]\nshow_today = false\n")?;
            jail.create_file("explicit.toml", "watch_interval_secs = 7\n")?;
            jail.set_env("NT_TRACKER__ORDER", "descending");

            let config: Config =
                Config::figment(Some(Path::new("user.toml")), Some(Path::new("explicit.toml")))
                    .extract()?;
            assert_eq!(config.watch_interval_secs, 7);
            assert!(!config.tracker.show_today);
            assert_eq!(config.tracker.order, EntryOrder::Descending);

            jail.set_env("NT_WATCH_INTERVAL_SECS", "9");
            let config: Config =
                Config::figment(Some(Path::new("user.toml")), Some(Path::new("explicit.toml")))
                    .extract()?;
            assert_eq!(config.watch_interval_secs, 9);
            Ok(())
        });
    }

    #[test]
    fn test_set_value_creates_and_preserves() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let path = jail.directory().join("nested/config.toml");

            set_value(&path, "tracker.only_first_tracker", "true").unwrap();
            set_value(&path, "tracker.duration_format", "fine").unwrap();
            set_value(&path, "watch_interval_secs", "15").unwrap();

            let table: toml::Table = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            let tracker = table["tracker"].as_table().unwrap();
            assert_eq!(tracker["only_first_tracker"].as_bool(), Some(true));
            assert_eq!(tracker["duration_format"].as_str(), Some("fine"));
            assert_eq!(table["watch_interval_secs"].as_integer(), Some(15));

            let config: Config = Config::figment(None, Some(&path)).extract()?;
            assert!(config.tracker.only_first_tracker);
            assert_eq!(config.tracker.duration_format, DurationFormat::Fine);
            Ok(())
        });
    }

    #[test]
    fn test_set_value_rejects_invalid() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");

        for (key, value) in [
            ("tracker.order", "sideways"),
            ("tracker.timestamp_format", "%Q"),
            ("tracker.csv_delimiter", ";;"),
            ("tracker.show_today", "maybe"),
            ("watch_interval_secs", "0"),
            ("tracker.colour", "blue"),
        ] {
            assert!(set_value(&path, key, value).is_err(), "{key}={value}");
        }
        assert!(!path.exists());
    }
}
