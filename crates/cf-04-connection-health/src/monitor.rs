//! # Connection Health Monitor
//!
//! Sans-IO heartbeat state machine. The caller feeds it the clock and the
//! received `Ping`/`Pong` messages and sends whatever it asks for.
//!
//! ```text
//!            Pong
//!   ┌──────────────────────┐
//!   ▼                      │
//! Healthy ──(no Pong for pong_timeout after oldest Ping)──► Unstable
//! ```
//!
//! Instability is reported, never fatal; the session decides what to do.

use serde::{Deserialize, Serialize};
use shared_types::PeerMessage;
use tracing::{debug, warn};

use crate::config::HeartbeatConfig;

/// Link status as seen from this peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[default]
    Healthy,
    Unstable,
}

/// Something the caller should act on after [`ConnectionHealthMonitor::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    /// Send this `Ping` to the peer.
    SendPing(PeerMessage),
    /// No `Pong` for `waited_ms` since the oldest unanswered `Ping`.
    BecameUnstable { waited_ms: u64 },
}

/// Result of a received `Pong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PongOutcome {
    pub latency_ms: u64,
    /// The link was unstable before this `Pong`.
    pub recovered: bool,
}

#[derive(Debug, Clone)]
pub struct ConnectionHealthMonitor {
    config: HeartbeatConfig,
    status: ConnectionStatus,
    /// Next time a `Ping` is due; `None` until started.
    next_ping_at: Option<u64>,
    last_ping_time: Option<u64>,
    /// Send time of the oldest `Ping` not yet answered.
    awaiting_since: Option<u64>,
    latency_ms: Option<u64>,
}

impl ConnectionHealthMonitor {
    pub fn new(config: HeartbeatConfig) -> Self {
        Self {
            config,
            status: ConnectionStatus::Healthy,
            next_ping_at: None,
            last_ping_time: None,
            awaiting_since: None,
            latency_ms: None,
        }
    }

    /// Begin heartbeating; the first `Ping` is due one interval after `now`.
    pub fn start(&mut self, now: u64) {
        self.reset();
        self.next_ping_at = Some(now.saturating_add(self.config.ping_interval_ms));
    }

    /// Stop heartbeating and forget all timing (transport closed).
    pub fn reset(&mut self) {
        self.status = ConnectionStatus::Healthy;
        self.next_ping_at = None;
        self.last_ping_time = None;
        self.awaiting_since = None;
        self.latency_ms = None;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Round trip of the last answered `Ping`.
    pub fn latency(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn last_ping_time(&self) -> Option<u64> {
        self.last_ping_time
    }

    pub fn is_running(&self) -> bool {
        self.next_ping_at.is_some()
    }

    /// Advance the clock.
    pub fn poll(&mut self, now: u64) -> Vec<HealthEvent> {
        let mut events = Vec::new();
        let Some(due) = self.next_ping_at else {
            return events;
        };

        if let Some(since) = self.awaiting_since {
            let waited_ms = now.saturating_sub(since);
            if self.status == ConnectionStatus::Healthy && waited_ms >= self.config.pong_timeout_ms {
                self.status = ConnectionStatus::Unstable;
                warn!(subsystem = "cf-04", waited_ms, "Connection unstable");
                events.push(HealthEvent::BecameUnstable { waited_ms });
            }
        }

        if now >= due {
            self.last_ping_time = Some(now);
            self.awaiting_since.get_or_insert(now);
            self.next_ping_at = Some(now.saturating_add(self.config.ping_interval_ms));
            events.push(HealthEvent::SendPing(PeerMessage::Ping { time: now }));
        }

        events
    }

    /// Reply to a received `Ping` by echoing its time.
    #[must_use]
    pub fn on_ping(&self, time: u64) -> PeerMessage {
        PeerMessage::Pong { time }
    }

    /// Account for a received `Pong`. Echoes from the future are ignored.
    pub fn on_pong(&mut self, echoed: u64, now: u64) -> Option<PongOutcome> {
        if echoed > now {
            debug!(subsystem = "cf-04", echoed, now, "Ignored pong from the future");
            return None;
        }

        let latency_ms = now - echoed;
        let recovered = self.status == ConnectionStatus::Unstable;
        self.latency_ms = Some(latency_ms);
        self.last_ping_time = None;
        self.awaiting_since = None;
        self.status = ConnectionStatus::Healthy;

        if recovered {
            debug!(subsystem = "cf-04", latency_ms, "Connection recovered");
        }
        Some(PongOutcome {
            latency_ms,
            recovered,
        })
    }
}
