//! # Local Key Signer
//!
//! In-process secp256k1 key implementing [`RecordSigner`]. Used by tests and
//! the demo binary; production signers sit behind a wallet.

use k256::ecdsa::SigningKey;
use shared_types::{Address, EcdsaSignature, Hash};

use crate::domain::ecdsa::{address_from_pubkey, sign_prehash};
use crate::domain::errors::SignerError;
use crate::ports::outbound::RecordSigner;

/// A signer holding its key in memory.
pub struct LocalKeySigner {
    key: SigningKey,
    address: Address,
}

impl LocalKeySigner {
    /// Fresh random key.
    pub fn random() -> Self {
        Self::from_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Key from a 32-byte secret scalar.
    ///
    /// # Errors
    /// * `SignerError::Rejected` - the bytes are not a valid secret scalar
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, SignerError> {
        let key = SigningKey::from_slice(secret)
            .map_err(|_| SignerError::Rejected("invalid secret key".into()))?;
        Ok(Self::from_key(key))
    }

    fn from_key(key: SigningKey) -> Self {
        let address = address_from_pubkey(key.verifying_key());
        Self { key, address }
    }
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &hex::encode(self.address))
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl RecordSigner for LocalKeySigner {
    fn identity(&self) -> Address {
        self.address
    }

    async fn sign_digest(&self, digest: Hash) -> Result<EcdsaSignature, SignerError> {
        sign_prehash(&digest, &self.key).map_err(|e| SignerError::Rejected(e.to_string()))
    }
}
