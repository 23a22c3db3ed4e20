//! # Inbound Ports (Driving Ports / API)
//!
//! The chain API the session drives.

use shared_types::{Address, EcdsaSignature, Hash, SignedRecord};

use crate::domain::entities::{ChainExport, ChainState, RecordPayload, UnsignedRecord, ValidationResult};
use crate::domain::errors::ChainError;

/// Primary Chain Validation API.
///
/// Signing is split in three so the caller can keep its event loop running
/// while the signature is outstanding:
///
/// ```text
/// prepare ──► (signer, async) ──► finalize
///    └──────── on signer error ──► abandon
/// ```
///
/// At most one record may be reserved at a time.
pub trait ChainValidationApi<P: RecordPayload> {
    /// Identity whose records this chain produces.
    fn local_identity(&self) -> Address;

    /// Genesis hash both chains are anchored on.
    fn genesis(&self) -> Hash;

    /// Reserve the next local sequence and build the digest to sign.
    ///
    /// # Errors
    /// * `ChainError::ReservationOutstanding` - a record is already reserved
    /// * `ChainError::Encoding` - the payload could not be encoded
    fn prepare(&mut self, payload: P, timestamp: u64) -> Result<UnsignedRecord<P>, ChainError>;

    /// Attach the signature, hash the record, store it and advance the local
    /// chain head.
    ///
    /// # Errors
    /// * `ChainError::StaleReservation` - `unsigned` is not the outstanding reservation
    /// * `ChainError::SignerMismatch` - the signature recovers to another key;
    ///   the reservation is released
    fn finalize(
        &mut self,
        unsigned: UnsignedRecord<P>,
        signature: EcdsaSignature,
    ) -> Result<SignedRecord<P>, ChainError>;

    /// Release a reservation whose signature will never arrive.
    fn abandon(&mut self, unsigned: &UnsignedRecord<P>);

    /// Verify a received record and admit it into the remote chain.
    ///
    /// Never panics; every outcome is reported in the result.
    fn validate_and_store(&mut self, record: SignedRecord<P>) -> ValidationResult<P>;

    /// Every local and remote record ordered by `(timestamp, sequence)`.
    fn combined_history(&self) -> Vec<SignedRecord<P>>;

    /// Both chains, for dispute resolution outside the session.
    fn export_chain(&self) -> ChainExport<P>;

    /// Read access to the chain bookkeeping.
    fn state(&self) -> &ChainState<P>;
}
