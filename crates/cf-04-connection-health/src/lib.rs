//! # Connection Health Subsystem (CF-04)
//!
//! Heartbeat over the session transport: a `Ping` every interval, a `Pong`
//! echo on receipt, latency from the echo and an unstable flag when the peer
//! goes quiet.

pub mod config;
pub mod monitor;

pub use config::{HeartbeatConfig, HeartbeatConfigError, MAX_HEARTBEAT_MS};
pub use monitor::{ConnectionHealthMonitor, ConnectionStatus, HealthEvent, PongOutcome};
