//! # Chain Errors
//!
//! Error and verdict types for record signing and validation.
//!
//! Two families live here:
//! - [`RecordRejection`] / [`ChainFlag`]: verdicts on a received record.
//!   These are data, returned inside a `ValidationResult`, never raised.
//! - [`ChainError`] / [`SignatureError`] / [`SignerError`]: failures of the
//!   local signing path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while producing or recovering a signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (scalar out of range, bad encoding)
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// The key refused to sign the digest
    #[error("Signing failed")]
    SigningFailed,
}

/// Errors reported by a [`RecordSigner`](crate::ports::outbound::RecordSigner).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    /// The signer cannot be reached (wallet locked, device gone).
    #[error("Signer unavailable: {0}")]
    Unavailable(String),

    /// The signer refused or failed to sign.
    #[error("Signer rejected digest: {0}")]
    Rejected(String),
}

/// Errors on the local record-production path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Signing failed; the reserved sequence has been released.
    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    /// The payload could not be canonically encoded.
    #[error("Payload encoding failed: {0}")]
    Encoding(String),

    /// The returned signature does not recover to the local identity.
    #[error("Signature does not recover to local identity")]
    SignerMismatch,

    /// A record is already being signed.
    #[error("Record {sequence} is still awaiting its signature")]
    ReservationOutstanding { sequence: u64 },

    /// The unsigned record does not match the outstanding reservation.
    #[error("Stale reservation for sequence {sequence}")]
    StaleReservation { sequence: u64 },
}

/// Why a received record was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordRejection {
    /// Recovered signer differs from the claimed `signer_id`.
    SignatureInvalid,
    /// The record claims to come from the local identity.
    SelfSigned,
    /// Recomputed hash differs from the transmitted one.
    HashMismatch,
    /// Sequence is not above the highest already admitted from this signer.
    SequenceRegression { sequence: u64, max_seen: u64 },
}

impl RecordRejection {
    /// Metric / log label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            RecordRejection::SignatureInvalid => "signature_invalid",
            RecordRejection::SelfSigned => "self_signed",
            RecordRejection::HashMismatch => "hash_mismatch",
            RecordRejection::SequenceRegression { .. } => "sequence_regression",
        }
    }
}

impl std::fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRejection::SequenceRegression { sequence, max_seen } => {
                write!(f, "sequence_regression ({sequence} <= {max_seen})")
            }
            other => f.write_str(other.label()),
        }
    }
}

/// Which back-link of a record failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainLink {
    /// `signer_prev_hash`
    SignerPrevious,
    /// `opponent_prev_hash`
    OpponentPrevious,
}

/// Non-fatal anomaly on an admitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainFlag {
    /// The sequence skipped ahead of the expected next value.
    SequenceGap { expected: u64, received: u64 },
    /// A back-link does not resolve to a known record.
    PossibleDesync { link: ChainLink },
}

impl ChainFlag {
    /// Metric / log label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ChainFlag::SequenceGap { .. } => "sequence_gap",
            ChainFlag::PossibleDesync { .. } => "possible_desync",
        }
    }
}
