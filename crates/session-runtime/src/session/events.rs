//! Notifications a session raises for its embedder (UI, logs, tests).

use cf_01_chain_validation::{ChainFlag, RecordRejection};
use cf_02_state_sync::MatchOutcome;
use shared_types::{Hash, Side};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RoleAssigned { role: Side },
    /// Whole seconds left before the fight.
    Countdown { remaining_secs: u64 },
    /// The countdown elapsed; the match is live.
    Fight,
    RecordSigned { sequence: u64, hash: Hash },
    /// A remote record was discarded.
    TrustWarning { rejection: RecordRejection },
    /// A remote record was admitted with a flag.
    ChainFlagged { flag: ChainFlag },
    /// The signer failed; the tick was skipped.
    SignerFailed { reason: String },
    LatencyMeasured { latency_ms: u64 },
    ConnectionUnstable { waited_ms: u64 },
    ConnectionRecovered { latency_ms: u64 },
    MatchEnded { outcome: MatchOutcome },
    Restarted { round: u32 },
    TransportError { reason: String },
    /// A received frame could not be decoded.
    MalformedFrame { reason: String },
    /// A decoded message was not acceptable in the current phase or mode.
    ProtocolViolation { reason: String },
    Disconnected,
}
