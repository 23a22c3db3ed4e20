//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.

pub mod local_signer;

pub use local_signer::LocalKeySigner;
