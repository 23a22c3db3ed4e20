//! # Outbound Ports (Driven Ports / SPI)
//!
//! The signing capability consumed by this subsystem. Key custody (wallet
//! generation, encryption, hardware) lives behind this trait.

use shared_types::{Address, EcdsaSignature, Hash};

use crate::domain::errors::SignerError;

/// Asynchronous signer over 32-byte digests.
#[async_trait::async_trait]
pub trait RecordSigner: Send + Sync {
    /// Address the produced signatures recover to.
    fn identity(&self) -> Address;

    /// Sign a typed-data digest.
    ///
    /// # Errors
    /// * `SignerError::Unavailable` - the key cannot be reached
    /// * `SignerError::Rejected` - the signer refused the digest
    async fn sign_digest(&self, digest: Hash) -> Result<EcdsaSignature, SignerError>;
}
