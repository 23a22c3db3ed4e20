//! # Chain Entities
//!
//! Payload contract, chain bookkeeping and validation verdicts.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, InputFrame, PlayerStateSnapshot, SignedRecord};

use super::ecdsa::keccak256;
use super::errors::{ChainError, ChainFlag, RecordRejection};

/// A value that can be carried in a signed record.
///
/// The canonical byte encoding is what gets hashed into the signed digest,
/// so both peers must produce identical bytes for identical values.
pub trait RecordPayload:
    Clone + std::fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Name used in the typed-data record type (`Signed<TYPE_NAME>(...)`).
    const TYPE_NAME: &'static str;

    /// Canonical bytes of the payload.
    fn canonical_bytes(&self) -> Result<Vec<u8>, ChainError> {
        bincode::serialize(self).map_err(|e| ChainError::Encoding(e.to_string()))
    }

    /// keccak-256 of the canonical bytes.
    fn payload_hash(&self) -> Result<Hash, ChainError> {
        Ok(keccak256(&self.canonical_bytes()?))
    }
}

impl RecordPayload for PlayerStateSnapshot {
    const TYPE_NAME: &'static str = "PlayerState";
}

impl RecordPayload for InputFrame {
    const TYPE_NAME: &'static str = "InputFrame";
}

/// Genesis hash for a session round: `keccak256("<session-id>#<round>")`.
///
/// Both peers derive it from the out-of-band session identifier, so the two
/// chains share an anchor without a handshake. Bumping the round severs
/// continuity with every earlier record.
#[must_use]
pub fn genesis_hash(session_id: &str, round: u32) -> Hash {
    keccak256(format!("{session_id}#{round}").as_bytes())
}

/// The signed fields of a record, minus payload and signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    pub signer_id: Address,
    pub signer_prev_hash: Hash,
    pub opponent_prev_hash: Hash,
    pub sequence: u64,
    pub timestamp: u64,
}

impl RecordHeader {
    /// Header of an already signed record.
    pub fn of<P>(record: &SignedRecord<P>) -> Self {
        Self {
            signer_id: record.signer_id,
            signer_prev_hash: record.signer_prev_hash,
            opponent_prev_hash: record.opponent_prev_hash,
            sequence: record.sequence,
            timestamp: record.timestamp,
        }
    }
}

/// A record whose sequence is reserved and whose digest awaits a signature.
#[derive(Clone, Debug)]
pub struct UnsignedRecord<P> {
    pub header: RecordHeader,
    pub payload: P,
    pub payload_hash: Hash,
    /// Typed-data digest to hand to the signer.
    pub digest: Hash,
}

impl<P> UnsignedRecord<P> {
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }
}

/// Both chains of one session.
#[derive(Clone, Debug)]
pub struct ChainState<P> {
    /// Last sequence reserved by the local peer.
    pub local_sequence: u64,
    /// Highest sequence admitted from the remote peer.
    pub remote_sequence: u64,
    pub last_local_hash: Hash,
    pub last_remote_hash: Hash,
    pub local_records: HashMap<Hash, SignedRecord<P>>,
    pub remote_records: HashMap<Hash, SignedRecord<P>>,
    /// Highest admitted sequence per remote signer.
    pub high_water: HashMap<Address, u64>,
}

impl<P> ChainState<P> {
    /// Empty chains anchored on `genesis`.
    pub fn new(genesis: Hash) -> Self {
        Self {
            local_sequence: 0,
            remote_sequence: 0,
            last_local_hash: genesis,
            last_remote_hash: genesis,
            local_records: HashMap::new(),
            remote_records: HashMap::new(),
            high_water: HashMap::new(),
        }
    }

    /// Highest sequence admitted from `signer`, 0 if none.
    #[must_use]
    pub fn max_seen(&self, signer: &Address) -> u64 {
        self.high_water.get(signer).copied().unwrap_or(0)
    }
}

/// Outcome of validating one received record.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationResult<P> {
    /// True when the record was admitted (possibly with flags).
    pub valid: bool,
    /// Set when the record was discarded.
    pub rejection: Option<RecordRejection>,
    /// Non-fatal anomalies on an admitted record.
    pub flags: Vec<ChainFlag>,
    /// The admitted record.
    pub record: Option<SignedRecord<P>>,
}

impl<P> ValidationResult<P> {
    /// Create an admitted result.
    pub fn accepted(record: SignedRecord<P>, flags: Vec<ChainFlag>) -> Self {
        Self {
            valid: true,
            rejection: None,
            flags,
            record: Some(record),
        }
    }

    /// Create a rejected result.
    pub fn rejected(reason: RecordRejection) -> Self {
        Self {
            valid: false,
            rejection: Some(reason),
            flags: Vec::new(),
            record: None,
        }
    }

    /// The admitted payload.
    pub fn payload(&self) -> Option<&P> {
        self.record.as_ref().map(|r| &r.payload)
    }
}

/// Both chains of a session, for an external dispute collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainExport<P> {
    pub genesis: Hash,
    pub local_identity: Address,
    /// Local records in sequence order.
    pub local_records: Vec<SignedRecord<P>>,
    /// Remote records in sequence order.
    pub remote_records: Vec<SignedRecord<P>>,
}
