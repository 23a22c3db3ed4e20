//! # Chain Validation Subsystem (CF-01)
//!
//! Signed, hash-linked record chains for a two-peer fight session.
//!
//! Each peer keeps two chains anchored on a shared genesis hash: the records
//! it produced and the records it admitted from the other side. Every record
//! points back into both, so either peer can later prove what it saw and when.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): keccak/secp256k1 logic, typed-data digests, no I/O
//! - **Ports Layer** (`ports/`): the chain API and the asynchronous signer port
//! - **Adapters Layer** (`adapters/`): in-process key signer
//! - **Service Layer** (`service.rs`): [`ChainValidator`], one per session round
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: Signatures with high S values are rejected
//! - **Zero-Trust**: transmitted hashes are recomputed, never trusted
//! - **Session Binding**: the signing domain is salted with the genesis hash

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::LocalKeySigner;
pub use domain::ecdsa::{address_from_pubkey, keccak256, recover_signer};
pub use domain::entities::{
    genesis_hash, ChainExport, ChainState, RecordHeader, RecordPayload, UnsignedRecord,
    ValidationResult,
};
pub use domain::errors::{ChainError, ChainFlag, ChainLink, RecordRejection, SignatureError, SignerError};
pub use ports::inbound::ChainValidationApi;
pub use ports::outbound::RecordSigner;
pub use service::ChainValidator;
