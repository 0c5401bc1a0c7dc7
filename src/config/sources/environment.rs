//! Environment variable source: SNAPDB__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix shared by every configuration variable
pub const ENV_PREFIX: &str = "SNAPDB";

/// Add environment variable overlay to builder.
/// `SNAPDB__STORAGE__LOCK_TIMEOUT_MS=100` sets `storage.lock_timeout_ms`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
