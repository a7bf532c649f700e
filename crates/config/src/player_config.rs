//! Player preferences

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Playback preferences applied when the engine starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Default narrator id
    pub narrator_id: u32,

    /// Default playback speed multiplier
    pub speed: f32,

    /// Times each verse plays before the queue advances; 0 means repeat
    /// forever
    pub repeat: u32,

    /// Progress refresh interval in milliseconds
    pub tick_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            narrator_id: 7,
            speed: 1.0,
            repeat: 1,
            tick_ms: 50,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.speed, 0.5, 3.0, "player.speed"),
            Validator::in_range(self.tick_ms, 10, 1000, "player.tick_ms"),
        ])
    }

    fn merge(&mut self, other: Self) {
        *self = other;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PlayerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_speed_out_of_range_rejected() {
        let config = PlayerConfig {
            speed: 5.0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "player.speed");
    }

    #[test]
    fn test_zero_repeat_means_infinite_and_is_valid() {
        let config = PlayerConfig {
            repeat: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
