//! Chapter download settings

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Settings for background chapter prefetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Verse fetches in flight at once per chapter download
    pub max_concurrent: usize,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Retry attempts for transient fetch failures
    pub max_retries: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl ConfigSection for DownloadConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.max_concurrent, 1, 16, "download.max_concurrent"),
            Validator::in_range(self.timeout_secs, 1, 300, "download.timeout_secs"),
            Validator::in_range(self.max_retries, 1, 10, "download.max_retries"),
        ])
    }

    fn merge(&mut self, other: Self) {
        *self = other;
    }

    fn section_name(&self) -> &'static str {
        "download"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DownloadConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = DownloadConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
