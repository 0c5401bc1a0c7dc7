//! XDG Base Directory locations for snapshot data and configuration.

use crate::error::SnapshotError;
use std::path::PathBuf;

const APP_DIR: &str = "snapdb";

/// Get XDG data home directory
///
/// Returns `$XDG_DATA_HOME` if set, otherwise `$HOME/.local/share`.
pub fn data_home() -> Option<PathBuf> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Some(PathBuf::from(xdg_data_home));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_home() -> Result<PathBuf, SnapshotError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        SnapshotError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// Default folder holding snapshot stores: `$XDG_DATA_HOME/snapdb/snapshots/`
pub fn snapshots_dir() -> Result<PathBuf, SnapshotError> {
    let data_home = data_home().ok_or_else(|| {
        SnapshotError::ConfigError(
            "Could not determine XDG data home directory (HOME not set)".to_string(),
        )
    })?;
    Ok(data_home.join(APP_DIR).join("snapshots"))
}

/// Global configuration file: `$XDG_CONFIG_HOME/snapdb/config.toml`
pub fn global_config_file() -> Result<PathBuf, SnapshotError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}
