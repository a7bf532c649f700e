//! Validated playback speed

use serde::{Deserialize, Serialize};

/// A playback rate multiplier, constrained to a sane range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackSpeed(f32);

impl PlaybackSpeed {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;
    pub const NORMAL: PlaybackSpeed = PlaybackSpeed(1.0);

    /// Creates a speed value, rejecting NaN/infinity and out-of-range rates.
    pub fn new(value: f32) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("Speed must be a finite number, got {}", value));
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(format!(
                "Speed must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn is_normal(&self) -> bool {
        (self.0 - 1.0).abs() < f32::EPSILON
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl std::fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}x", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        assert!(PlaybackSpeed::new(0.5).is_ok());
        assert!(PlaybackSpeed::new(1.0).is_ok());
        assert!(PlaybackSpeed::new(3.0).is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(PlaybackSpeed::new(0.49).is_err());
        assert!(PlaybackSpeed::new(3.01).is_err());
        assert!(PlaybackSpeed::new(f32::NAN).is_err());
        assert!(PlaybackSpeed::new(f32::INFINITY).is_err());
    }

    #[test]
    fn test_is_normal() {
        assert!(PlaybackSpeed::NORMAL.is_normal());
        assert!(!PlaybackSpeed::new(1.5).unwrap().is_normal());
    }

    #[test]
    fn test_display() {
        assert_eq!(PlaybackSpeed::new(1.25).unwrap().to_string(), "1.25x");
    }
}
