//! # Replay Configuration

use serde::{Deserialize, Serialize};

use crate::domain::ReplayError;

/// Replay configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Entries applied per second at speed 1.0.
    pub target_ticks_per_second: u32,

    /// Slowest allowed speed multiplier.
    pub min_speed: f64,

    /// Fastest allowed speed multiplier.
    pub max_speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            target_ticks_per_second: 30,
            min_speed: 0.1,
            max_speed: 5.0,
        }
    }
}

impl ReplayConfig {
    /// Create a config for testing (same bounds, round tick rate).
    pub fn for_testing() -> Self {
        Self {
            target_ticks_per_second: 10,
            ..Self::default()
        }
    }

    /// Clamp a requested speed into the allowed range.
    #[must_use]
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return 1.0_f64.clamp(self.min_speed, self.max_speed);
        }
        speed.clamp(self.min_speed, self.max_speed)
    }

    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.target_ticks_per_second == 0 {
            return Err(ReplayError::InvalidConfig(
                "target_ticks_per_second must be positive".into(),
            ));
        }
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed) {
            return Err(ReplayError::InvalidConfig(format!(
                "speed bounds must satisfy 0 < min <= max, got {}..{}",
                self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }
}
