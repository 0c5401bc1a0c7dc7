//! Configuration
//!
//! Layered configuration built with the `config` crate: built-in defaults, the
//! per-user file, an optional explicit file, then `SNAPDB__*` environment
//! variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::SnapshotError;
use crate::logging::LoggingConfig;
use crate::snapshot::BatchConfig;
use crate::store::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_cache_capacity_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_flush_every_ms() -> u64 {
    500
}

/// Store location and sled tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Folder holding snapshot stores; `None` means the XDG data default
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    #[serde(default = "default_cache_capacity_bytes")]
    pub cache_capacity_bytes: u64,

    /// Background fsync interval; 0 flushes only on close
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            lock_timeout_ms: default_lock_timeout_ms(),
            cache_capacity_bytes: default_cache_capacity_bytes(),
            flush_every_ms: default_flush_every_ms(),
        }
    }
}

impl StorageConfig {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            cache_capacity: self.cache_capacity_bytes,
            flush_every_ms: (self.flush_every_ms > 0).then_some(self.flush_every_ms),
        }
    }

    /// The configured root, or `$XDG_DATA_HOME/snapdb/snapshots`.
    pub fn snapshots_root(&self) -> Result<PathBuf, SnapshotError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => paths::xdg_root::snapshots_dir(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapdbConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
