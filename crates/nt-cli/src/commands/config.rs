//! Config command: show, edit and locate the configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{Config, default_config_file, set_value};

/// Resolves the file `nt config set` writes to.
fn target_file(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(default_config_file)
        .context("could not determine the config directory")
}

/// Prints the effective configuration as TOML.
pub fn show(config: &Config) -> Result<()> {
    let text = toml::to_string_pretty(config).context("failed to serialize configuration")?;
    print!("{text}");
    Ok(())
}

pub fn set(explicit: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let path = target_file(explicit)?;
    set_value(&path, key, value)?;
    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

pub fn path(explicit: Option<&Path>) -> Result<()> {
    println!("{}", target_file(explicit)?.display());
    Ok(())
}
