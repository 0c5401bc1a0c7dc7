//! Per-user config file under the XDG config home. Optional.

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use tracing::debug;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::global_config_file() {
        Ok(path) => {
            debug!(path = %path.display(), "Global config file source");
            Ok(builder.add_source(File::from(path).required(false)))
        }
        // no HOME: nothing to layer
        Err(_) => Ok(builder),
    }
}
