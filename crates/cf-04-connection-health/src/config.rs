//! # Heartbeat Configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HeartbeatConfigError {
    #[error("ping_interval_ms must be positive")]
    ZeroInterval,

    #[error("pong_timeout_ms ({timeout}) must be at least ping_interval_ms ({interval})")]
    TimeoutBelowInterval { timeout: u64, interval: u64 },

    #[error("{field} ({value}) exceeds the 3600000 ms limit")]
    TooLong { field: &'static str, value: u64 },
}

/// Upper bound for both heartbeat timers.
pub const MAX_HEARTBEAT_MS: u64 = 3_600_000;

/// Heartbeat configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Spacing between pings.
    pub ping_interval_ms: u64,

    /// Silence after the oldest unanswered ping that marks the link unstable.
    pub pong_timeout_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 5_000,
            pong_timeout_ms: 10_000,
        }
    }
}

impl HeartbeatConfig {
    /// Create a config for testing (sub-second heartbeat).
    pub fn for_testing() -> Self {
        Self {
            ping_interval_ms: 100,
            pong_timeout_ms: 200,
        }
    }

    pub fn validate(&self) -> Result<(), HeartbeatConfigError> {
        if self.ping_interval_ms == 0 {
            return Err(HeartbeatConfigError::ZeroInterval);
        }
        if self.ping_interval_ms > MAX_HEARTBEAT_MS {
            return Err(HeartbeatConfigError::TooLong {
                field: "ping_interval_ms",
                value: self.ping_interval_ms,
            });
        }
        if self.pong_timeout_ms > MAX_HEARTBEAT_MS {
            return Err(HeartbeatConfigError::TooLong {
                field: "pong_timeout_ms",
                value: self.pong_timeout_ms,
            });
        }
        if self.pong_timeout_ms < self.ping_interval_ms {
            return Err(HeartbeatConfigError::TimeoutBelowInterval {
                timeout: self.pong_timeout_ms,
                interval: self.ping_interval_ms,
            });
        }
        Ok(())
    }
}
