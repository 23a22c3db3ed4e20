//! # Session Configuration
//!
//! Unified configuration for one peer session and the subsystems it drives.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CF_SESSION_ID` | `session_id` (shared out of band with the peer) |
//! | `CF_SYNC_MODE` | `sync_mode` (`trust` or `raw`) |
//! | `CF_FRAME_RATE` | `frame_rate` |
//! | `CF_TICK_RATE` | `sync.target_ticks_per_second` |
//! | `CF_MATCH_SECONDS` | `sync.match_duration_secs` |
//! | `CF_COUNTDOWN_SECONDS` | `sync.countdown_secs` |
//! | `CF_PING_INTERVAL_MS` | `heartbeat.ping_interval_ms` |
//! | `CF_PONG_TIMEOUT_MS` | `heartbeat.pong_timeout_ms` |

use std::str::FromStr;

use cf_02_state_sync::SyncConfig;
use cf_03_replay::ReplayConfig;
use cf_04_connection_health::HeartbeatConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Local simulation rate.
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// How snapshots travel between the peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncMode {
    /// Every snapshot is wrapped in a signed, chained record.
    #[default]
    TrustMinimized,
    /// Bare snapshots, no chain.
    Raw,
}

impl SyncMode {
    pub fn label(self) -> &'static str {
        match self {
            SyncMode::TrustMinimized => "trust_minimized",
            SyncMode::Raw => "raw",
        }
    }
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" | "trust_minimized" | "signed" => Ok(SyncMode::TrustMinimized),
            "raw" => Ok(SyncMode::Raw),
            other => Err(ConfigError::UnknownSyncMode(other.to_string())),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session_id must not be empty")]
    EmptySessionId,

    #[error("frame_rate must be in 1..=240, got {0}")]
    InvalidFrameRate(u32),

    #[error("unknown sync mode: {0}")]
    UnknownSyncMode(String),

    #[error("invalid sync config: {0}")]
    Sync(String),

    #[error("invalid heartbeat config: {0}")]
    Heartbeat(String),

    #[error("invalid replay config: {0}")]
    Replay(String),
}

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Identifier both peers agreed on; salts the genesis hash.
    pub session_id: String,
    pub sync_mode: SyncMode,
    /// Frames per second of the local simulation callback.
    pub frame_rate: u32,
    pub sync: SyncConfig,
    pub heartbeat: HeartbeatConfig,
    pub replay: ReplayConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            sync_mode: SyncMode::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            sync: SyncConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a config for testing (short match, no countdown, fast heartbeat).
    pub fn for_testing(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            sync_mode: SyncMode::TrustMinimized,
            frame_rate: DEFAULT_FRAME_RATE,
            sync: SyncConfig::for_testing(),
            heartbeat: HeartbeatConfig::for_testing(),
            replay: ReplayConfig::for_testing(),
        }
    }

    /// Defaults overridden from `CF_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(id) = std::env::var("CF_SESSION_ID") {
            config.session_id = id;
        }
        if let Ok(mode) = std::env::var("CF_SYNC_MODE") {
            match mode.parse() {
                Ok(m) => config.sync_mode = m,
                Err(e) => warn!(subsystem = "session", error = %e, "Ignoring CF_SYNC_MODE"),
            }
        }
        override_from_env("CF_FRAME_RATE", &mut config.frame_rate);
        override_from_env("CF_TICK_RATE", &mut config.sync.target_ticks_per_second);
        override_from_env("CF_MATCH_SECONDS", &mut config.sync.match_duration_secs);
        override_from_env("CF_COUNTDOWN_SECONDS", &mut config.sync.countdown_secs);
        override_from_env("CF_PING_INTERVAL_MS", &mut config.heartbeat.ping_interval_ms);
        override_from_env("CF_PONG_TIMEOUT_MS", &mut config.heartbeat.pong_timeout_ms);

        config.replay.target_ticks_per_second = config.sync.target_ticks_per_second;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_id.trim().is_empty() {
            return Err(ConfigError::EmptySessionId);
        }
        if self.frame_rate == 0 || self.frame_rate > 240 {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }
        self.sync
            .validate()
            .map_err(|e| ConfigError::Sync(e.to_string()))?;
        self.heartbeat
            .validate()
            .map_err(|e| ConfigError::Heartbeat(e.to_string()))?;
        self.replay
            .validate()
            .map_err(|e| ConfigError::Replay(e.to_string()))?;
        Ok(())
    }

    /// Frame period in milliseconds.
    pub fn frame_interval_ms(&self) -> u64 {
        (1000 / u64::from(self.frame_rate.max(1))).max(1)
    }
}

fn override_from_env<T: FromStr>(var: &str, slot: &mut T) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!(subsystem = "session", var, value = %raw, "Ignoring unparseable override"),
    }
}
