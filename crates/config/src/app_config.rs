//! Application-level configuration

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Override for the audio cache directory; `None` means the platform
    /// data directory
    pub cache_dir: Option<PathBuf>,

    /// Log filter applied when the process sets up logging (e.g. "info",
    /// "murattal_network=debug")
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_filter: "info".to_string(),
        }
    }
}

impl ConfigSection for AppConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::not_empty(
            &self.log_filter,
            "app.log_filter",
        )])
    }

    fn merge(&mut self, other: Self) {
        *self = other;
    }

    fn section_name(&self) -> &'static str {
        "app"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_log_filter_rejected() {
        let config = AppConfig {
            log_filter: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
