//! # Signed Records
//!
//! The envelope that wraps every exchanged payload in trust-minimized mode.
//!
//! ## Security Properties
//!
//! - **Chain Linkage**: `signer_prev_hash` links to the signer's previous
//!   record, `opponent_prev_hash` to the last record the signer saw from the
//!   other side. Both chains are anchored on the same genesis hash.
//! - **Post-Signature Integrity**: `hash` covers every field including the
//!   signature, so it is only defined once the record is signed.
//! - **Never Trusted**: receivers recompute `hash`; the transmitted value is
//!   only compared against the recomputation.

use serde::{Deserialize, Serialize};

use crate::entities::{Address, Hash};

/// ECDSA signature on the secp256k1 curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Serialized length: r || s || v.
    pub const LEN: usize = 65;

    /// `r || s || v` bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// A payload signed by one peer and linked into that peer's record chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedRecord<P> {
    /// Claimed identity of the signer. Verified by signature recovery.
    pub signer_id: Address,
    /// Hash of this signer's previous record, or genesis if first.
    pub signer_prev_hash: Hash,
    /// Hash of the last record this signer claims to have seen from the
    /// other side, or genesis.
    pub opponent_prev_hash: Hash,
    /// Per-signer counter starting at 1, strictly increasing.
    pub sequence: u64,
    /// Milliseconds since the Unix epoch when the record was created.
    pub timestamp: u64,
    /// The signed payload (a state snapshot or an input frame).
    pub payload: P,
    /// Typed-data signature over the fields above.
    pub signature: EcdsaSignature,
    /// keccak-256 over every field including the signature.
    pub hash: Hash,
}
