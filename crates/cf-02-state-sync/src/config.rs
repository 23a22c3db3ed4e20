//! # Sync Configuration

use serde::{Deserialize, Serialize};

use crate::domain::SyncError;

/// Default snapshot emission rate.
pub const DEFAULT_TICKS_PER_SECOND: u32 = 30;

/// Default match length.
pub const DEFAULT_MATCH_SECONDS: u64 = 60;

/// Default pre-fight countdown.
pub const DEFAULT_COUNTDOWN_SECONDS: u64 = 3;

/// Longest accepted match.
pub const MAX_MATCH_SECONDS: u64 = 3_600;

/// Longest accepted countdown.
pub const MAX_COUNTDOWN_SECONDS: u64 = 60;

/// State synchronization configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Snapshots emitted per second.
    pub target_ticks_per_second: u32,

    /// Match length in seconds.
    pub match_duration_secs: u64,

    /// Countdown between role assignment and the fight.
    pub countdown_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            match_duration_secs: DEFAULT_MATCH_SECONDS,
            countdown_secs: DEFAULT_COUNTDOWN_SECONDS,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (short match, no countdown).
    pub fn for_testing() -> Self {
        Self {
            target_ticks_per_second: 10,
            match_duration_secs: 5,
            countdown_secs: 0,
        }
    }

    /// Minimum spacing between two emissions, in milliseconds.
    #[must_use]
    pub fn emit_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.target_ticks_per_second.max(1))
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.target_ticks_per_second == 0 || self.target_ticks_per_second > 240 {
            return Err(SyncError::InvalidConfig(format!(
                "target_ticks_per_second must be in 1..=240, got {}",
                self.target_ticks_per_second
            )));
        }
        if self.match_duration_secs == 0 || self.match_duration_secs > MAX_MATCH_SECONDS {
            return Err(SyncError::InvalidConfig(format!(
                "match_duration_secs must be in 1..={MAX_MATCH_SECONDS}, got {}",
                self.match_duration_secs
            )));
        }
        if self.countdown_secs > MAX_COUNTDOWN_SECONDS {
            return Err(SyncError::InvalidConfig(format!(
                "countdown_secs must be at most {MAX_COUNTDOWN_SECONDS}, got {}",
                self.countdown_secs
            )));
        }
        Ok(())
    }
}
