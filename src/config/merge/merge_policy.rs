//! Built-in defaults, the bottom layer of every merge.

use crate::config::SnapdbConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// A builder seeded with `SnapdbConfig::default()`.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = SnapdbConfig::default();
    let builder = Config::builder()
        .set_default("storage.lock_timeout_ms", defaults.storage.lock_timeout_ms as i64)?
        .set_default(
            "storage.cache_capacity_bytes",
            defaults.storage.cache_capacity_bytes as i64,
        )?
        .set_default("storage.flush_every_ms", defaults.storage.flush_every_ms as i64)?
        .set_default("batch.capacity", defaults.batch.capacity as i64)?
        .set_default("batch.idle_flush_ms", defaults.batch.idle_flush_ms as i64)?
        .set_default("batch.idle_wait_secs", defaults.batch.idle_wait_secs as i64)?
        .set_default("logging.enabled", defaults.logging.enabled)?
        .set_default("logging.level", defaults.logging.level)?
        .set_default("logging.format", defaults.logging.format)?
        .set_default("logging.output", defaults.logging.output)?;
    Ok(builder)
}
