//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::SnapdbConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(explicit: Option<&Path>) -> Result<SnapdbConfig, ConfigError> {
        MergeService::load(explicit)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<SnapdbConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    /// Create default configuration.
    pub fn default() -> SnapdbConfig {
        SnapdbConfig::default()
    }
}
