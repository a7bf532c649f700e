//! Murattal configuration system
//!
//! Trait-based, extensible configuration: each feature defines its config
//! as a type implementing `ConfigSection`. Invalid values degrade to
//! warnings on load, files are written atomically, and all errors are
//! handled via Result types.

mod error;
mod manager;
mod persistence;
mod validation;

mod app_config;
mod download_config;
mod player_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::AppConfig;
pub use download_config::DownloadConfig;
pub use player_config::PlayerConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
///
/// Contains all config sections; new sections added here are automatically
/// included in load/save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Player preferences
    pub player: PlayerConfig,

    /// Chapter download settings
    pub download: DownloadConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration, collecting errors across all
    /// sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.download.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`.
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.download.merge(other.download);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}
