//! # Typed-Data Digests
//!
//! The structured-data hashing (EIP-712 layout) behind every record signature,
//! and the post-signature record hash.
//!
//! ```text
//! digest      = keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)
//! domain      = { name: "CryptoFighter", version: "1", chainId: 1,
//!                 verifyingContract: 0x00…00, salt: genesis }
//! structHash  = keccak256(typeHash ‖ signerId ‖ signerPrevHash ‖
//!                         opponentPrevHash ‖ keccak256(payload) ‖
//!                         timestamp ‖ sequence)
//! recordHash  = keccak256(typeHash ‖ … ‖ sequence ‖ r ‖ s ‖ v)
//! ```
//!
//! Salting the domain with the session genesis binds every signature to one
//! session and round: a record lifted into another session recovers to a
//! different signer.

use shared_types::{Address, Hash, ZERO_HASH};

use super::ecdsa::keccak256;
use super::entities::{RecordHeader, RecordPayload};
use shared_types::EcdsaSignature;

/// Domain name shared by both peers.
pub const DOMAIN_NAME: &str = "CryptoFighter";
/// Domain version.
pub const DOMAIN_VERSION: &str = "1";
/// Domain chain id.
pub const DOMAIN_CHAIN_ID: u64 = 1;

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract,bytes32 salt)";

/// Type string of a signed record carrying payload `P`.
#[must_use]
pub fn record_type<P: RecordPayload>() -> String {
    format!(
        "Signed{}(address signerId,bytes32 signerPrevHash,bytes32 opponentPrevHash,bytes payload,uint256 timestamp,uint256 sequence)",
        P::TYPE_NAME
    )
}

/// Domain separator salted with the session genesis.
#[must_use]
pub fn domain_separator(genesis: &Hash) -> Hash {
    let mut buf = Vec::with_capacity(32 * 6);
    buf.extend_from_slice(&keccak256(DOMAIN_TYPE.as_bytes()));
    buf.extend_from_slice(&keccak256(DOMAIN_NAME.as_bytes()));
    buf.extend_from_slice(&keccak256(DOMAIN_VERSION.as_bytes()));
    buf.extend_from_slice(&u256_word(DOMAIN_CHAIN_ID));
    buf.extend_from_slice(&address_word(&[0u8; 20]));
    buf.extend_from_slice(genesis);
    keccak256(&buf)
}

/// ABI-encoded struct body (type hash followed by every field word).
fn encode_struct<P: RecordPayload>(header: &RecordHeader, payload_hash: &Hash) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32 * 7 + EcdsaSignature::LEN);
    buf.extend_from_slice(&keccak256(record_type::<P>().as_bytes()));
    buf.extend_from_slice(&address_word(&header.signer_id));
    buf.extend_from_slice(&header.signer_prev_hash);
    buf.extend_from_slice(&header.opponent_prev_hash);
    buf.extend_from_slice(payload_hash);
    buf.extend_from_slice(&u256_word(header.timestamp));
    buf.extend_from_slice(&u256_word(header.sequence));
    buf
}

/// Struct hash of a record header.
#[must_use]
pub fn struct_hash<P: RecordPayload>(header: &RecordHeader, payload_hash: &Hash) -> Hash {
    keccak256(&encode_struct::<P>(header, payload_hash))
}

/// The 32-byte digest a signer signs.
#[must_use]
pub fn signing_digest<P: RecordPayload>(
    domain_separator: &Hash,
    header: &RecordHeader,
    payload_hash: &Hash,
) -> Hash {
    let mut buf = [0u8; 2 + 32 + 32];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain_separator);
    buf[34..].copy_from_slice(&struct_hash::<P>(header, payload_hash));
    keccak256(&buf)
}

/// Hash identifying a signed record. Covers the signature.
#[must_use]
pub fn record_hash<P: RecordPayload>(
    header: &RecordHeader,
    payload_hash: &Hash,
    signature: &EcdsaSignature,
) -> Hash {
    let mut buf = encode_struct::<P>(header, payload_hash);
    buf.extend_from_slice(&signature.to_bytes());
    keccak256(&buf)
}

fn u256_word(value: u64) -> Hash {
    let mut word = ZERO_HASH;
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> Hash {
    let mut word = ZERO_HASH;
    word[12..].copy_from_slice(address);
    word
}
