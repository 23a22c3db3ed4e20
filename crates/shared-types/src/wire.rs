//! # Wire Payloads
//!
//! Every message exchanged over the transport channel, and the versioned
//! codec that turns them into bytes.
//!
//! Received bytes are parsed into plain values by [`decode`] and checked
//! structurally before anything downstream sees them. Signature and chain
//! checks happen later, in the chain validation subsystem.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::entities::{PlayerStateSnapshot, Side, MAX_HEALTH};
use crate::errors::WireError;
use crate::record::SignedRecord;

/// Current wire version.
pub const WIRE_VERSION: u8 = 1;

/// Upper bound on a single encoded frame.
pub const MAX_FRAME_BYTES: u64 = 64 * 1024;

/// All payload variants carried by the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PeerMessage {
    /// Sent once by the accepting side: the role the receiver must take.
    RoleAssignment { role: Side },
    /// A signed, chained state snapshot (trust-minimized mode).
    SignedState {
        record: SignedRecord<PlayerStateSnapshot>,
    },
    /// A bare state snapshot (raw mode).
    RawState { snapshot: PlayerStateSnapshot },
    /// Heartbeat request carrying the sender's clock.
    Ping { time: u64 },
    /// Heartbeat reply echoing the `Ping` time.
    Pong { time: u64 },
}

impl PeerMessage {
    /// Variant name for logs and metrics labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::RoleAssignment { .. } => "role_assignment",
            PeerMessage::SignedState { .. } => "signed_state",
            PeerMessage::RawState { .. } => "raw_state",
            PeerMessage::Ping { .. } => "ping",
            PeerMessage::Pong { .. } => "pong",
        }
    }

    /// Structural checks that do not need any session context.
    pub fn validate(&self) -> Result<(), WireError> {
        match self {
            PeerMessage::SignedState { record } => {
                if record.sequence == 0 {
                    return Err(WireError::Malformed("record sequence must start at 1".into()));
                }
                validate_snapshot(&record.payload)
            }
            PeerMessage::RawState { snapshot } => validate_snapshot(snapshot),
            PeerMessage::RoleAssignment { .. } | PeerMessage::Ping { .. } | PeerMessage::Pong { .. } => {
                Ok(())
            }
        }
    }
}

fn validate_snapshot(snapshot: &PlayerStateSnapshot) -> Result<(), WireError> {
    if snapshot.health > MAX_HEALTH {
        return Err(WireError::Malformed(format!(
            "health {} exceeds {}",
            snapshot.health, MAX_HEALTH
        )));
    }
    let finite = [
        snapshot.position.x,
        snapshot.position.y,
        snapshot.velocity.x,
        snapshot.velocity.y,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite {
        return Err(WireError::Malformed("non-finite position or velocity".into()));
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct Frame {
    version: u8,
    message: PeerMessage,
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_FRAME_BYTES)
}

/// Encode a message into a versioned frame.
pub fn encode(message: &PeerMessage) -> Result<Vec<u8>, WireError> {
    let frame = Frame {
        version: WIRE_VERSION,
        message: message.clone(),
    };
    wire_options()
        .serialize(&frame)
        .map_err(|e| WireError::Encode(e.to_string()))
}

/// Parse a frame received from the remote peer.
///
/// Returns a plain value; the caller never receives anything that was not
/// structurally validated.
pub fn decode(bytes: &[u8]) -> Result<PeerMessage, WireError> {
    let frame: Frame = wire_options()
        .deserialize(bytes)
        .map_err(|e| WireError::Decode(e.to_string()))?;

    if frame.version != WIRE_VERSION {
        return Err(WireError::UnsupportedVersion {
            received: frame.version,
            supported: WIRE_VERSION,
        });
    }

    frame.message.validate()?;
    Ok(frame.message)
}
