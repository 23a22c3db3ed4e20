//! # Chain Validation Service
//!
//! Application service implementing [`ChainValidationApi`].
//!
//! ## Architecture
//!
//! - Owns the [`ChainState`] of one session round
//! - Delegates hashing and recovery to the domain layer
//! - Consumes a [`RecordSigner`] only through [`ChainValidator::create_and_sign`];
//!   event loops that must not block on the signer use the
//!   `prepare` / `finalize` / `abandon` split directly
//!
//! ## Validation Order
//!
//! `validate_and_store` short-circuits on the first fatal check:
//!
//! 1. Signature recovers to `signer_id`, else `SignatureInvalid`
//!    (`HashMismatch` when the record was also altered after signing)
//! 2. `signer_id` is not the local identity, else `SelfSigned`
//! 3. Recomputed hash equals the transmitted hash, else `HashMismatch`
//! 4. Sequence above the signer's high-water mark, else `SequenceRegression`;
//!    a skip is admitted with `SequenceGap`
//! 5. `signer_prev_hash` resolves, else `PossibleDesync` (admitted)
//! 6. `opponent_prev_hash` resolves, else `PossibleDesync` (admitted)
//! 7. Store and advance the remote head

use shared_types::{short_hex, Address, EcdsaSignature, Hash, SignedRecord};
use tracing::{debug, warn};

use crate::domain::ecdsa::recover_signer;
use crate::domain::entities::{
    ChainExport, ChainState, RecordHeader, RecordPayload, UnsignedRecord, ValidationResult,
};
use crate::domain::errors::{ChainError, ChainFlag, ChainLink, RecordRejection};
use crate::domain::typed_data::{domain_separator, record_hash, signing_digest};
use crate::ports::inbound::ChainValidationApi;
use crate::ports::outbound::RecordSigner;

/// Two cross-linked record chains for one session round.
pub struct ChainValidator<P> {
    local_identity: Address,
    genesis: Hash,
    domain_separator: Hash,
    state: ChainState<P>,
    /// Sequence of the record currently awaiting its signature.
    reserved: Option<u64>,
}

impl<P: RecordPayload> ChainValidator<P> {
    /// Create empty chains for `local_identity`, anchored on `genesis`.
    pub fn new(local_identity: Address, genesis: Hash) -> Self {
        Self {
            local_identity,
            genesis,
            domain_separator: domain_separator(&genesis),
            state: ChainState::new(genesis),
            reserved: None,
        }
    }

    /// Sequence of the record awaiting its signature, if any.
    #[must_use]
    pub fn reserved(&self) -> Option<u64> {
        self.reserved
    }

    /// Sign and chain a payload in one call.
    ///
    /// On signer failure the reserved sequence is released and the next call
    /// reuses it.
    pub async fn create_and_sign<S>(
        &mut self,
        payload: P,
        timestamp: u64,
        signer: &S,
    ) -> Result<SignedRecord<P>, ChainError>
    where
        S: RecordSigner + ?Sized,
    {
        let unsigned = self.prepare(payload, timestamp)?;
        match signer.sign_digest(unsigned.digest).await {
            Ok(signature) => self.finalize(unsigned, signature),
            Err(e) => {
                self.abandon(&unsigned);
                Err(ChainError::SignerUnavailable(e.to_string()))
            }
        }
    }

    fn hash_of(&self, record: &SignedRecord<P>, payload_hash: &Hash) -> Hash {
        record_hash::<P>(&RecordHeader::of(record), payload_hash, &record.signature)
    }

    fn reject(&self, record: &SignedRecord<P>, reason: RecordRejection) -> ValidationResult<P> {
        warn!(
            subsystem = "cf-01",
            signer = %short_hex(&record.signer_id),
            sequence = record.sequence,
            hash = %short_hex(&record.hash),
            reason = %reason,
            "Rejected remote record"
        );
        ValidationResult::rejected(reason)
    }
}

impl<P: RecordPayload> ChainValidationApi<P> for ChainValidator<P> {
    fn local_identity(&self) -> Address {
        self.local_identity
    }

    fn genesis(&self) -> Hash {
        self.genesis
    }

    fn prepare(&mut self, payload: P, timestamp: u64) -> Result<UnsignedRecord<P>, ChainError> {
        if let Some(sequence) = self.reserved {
            return Err(ChainError::ReservationOutstanding { sequence });
        }

        let payload_hash = payload.payload_hash()?;
        let header = RecordHeader {
            signer_id: self.local_identity,
            signer_prev_hash: self.state.last_local_hash,
            opponent_prev_hash: self.state.last_remote_hash,
            sequence: self.state.local_sequence + 1,
            timestamp,
        };
        let digest = signing_digest::<P>(&self.domain_separator, &header, &payload_hash);

        self.state.local_sequence = header.sequence;
        self.reserved = Some(header.sequence);

        Ok(UnsignedRecord {
            header,
            payload,
            payload_hash,
            digest,
        })
    }

    fn finalize(
        &mut self,
        unsigned: UnsignedRecord<P>,
        signature: EcdsaSignature,
    ) -> Result<SignedRecord<P>, ChainError> {
        let sequence = unsigned.sequence();
        if self.reserved != Some(sequence) || unsigned.header.signer_prev_hash != self.state.last_local_hash
        {
            return Err(ChainError::StaleReservation { sequence });
        }

        if recover_signer(&unsigned.digest, &signature).ok() != Some(self.local_identity) {
            self.abandon(&unsigned);
            return Err(ChainError::SignerMismatch);
        }

        let hash = record_hash::<P>(&unsigned.header, &unsigned.payload_hash, &signature);
        let header = unsigned.header;
        let record = SignedRecord {
            signer_id: header.signer_id,
            signer_prev_hash: header.signer_prev_hash,
            opponent_prev_hash: header.opponent_prev_hash,
            sequence: header.sequence,
            timestamp: header.timestamp,
            payload: unsigned.payload,
            signature,
            hash,
        };

        self.state.local_records.insert(hash, record.clone());
        self.state.last_local_hash = hash;
        self.reserved = None;

        debug!(
            subsystem = "cf-01",
            sequence,
            hash = %short_hex(&hash),
            "Signed local record"
        );
        Ok(record)
    }

    fn abandon(&mut self, unsigned: &UnsignedRecord<P>) {
        let sequence = unsigned.sequence();
        if self.reserved == Some(sequence) && self.state.local_sequence == sequence {
            self.state.local_sequence -= 1;
            self.reserved = None;
            debug!(subsystem = "cf-01", sequence, "Released sequence reservation");
        }
    }

    fn validate_and_store(&mut self, record: SignedRecord<P>) -> ValidationResult<P> {
        let payload_hash = match record.payload.payload_hash() {
            Ok(h) => h,
            Err(_) => return self.reject(&record, RecordRejection::HashMismatch),
        };
        let header = RecordHeader::of(&record);

        // 1. Signature
        let digest = signing_digest::<P>(&self.domain_separator, &header, &payload_hash);
        let recovered = recover_signer(&digest, &record.signature).ok();
        if recovered != Some(record.signer_id) {
            let reason = if self.hash_of(&record, &payload_hash) != record.hash {
                RecordRejection::HashMismatch
            } else {
                RecordRejection::SignatureInvalid
            };
            return self.reject(&record, reason);
        }

        // 2. Self-signed
        if record.signer_id == self.local_identity {
            return self.reject(&record, RecordRejection::SelfSigned);
        }

        // 3. Hash
        let computed = self.hash_of(&record, &payload_hash);
        if computed != record.hash {
            return self.reject(&record, RecordRejection::HashMismatch);
        }

        // 4. Sequence
        let mut flags = Vec::new();
        let max_seen = self.state.max_seen(&record.signer_id);
        if record.sequence <= max_seen {
            return self.reject(
                &record,
                RecordRejection::SequenceRegression {
                    sequence: record.sequence,
                    max_seen,
                },
            );
        }
        let expected = max_seen + 1;
        if record.sequence != expected {
            flags.push(ChainFlag::SequenceGap {
                expected,
                received: record.sequence,
            });
        }

        // 5. Signer back-link
        let signer_link_ok = if record.sequence == 1 {
            record.signer_prev_hash == self.genesis
        } else {
            self.state
                .remote_records
                .get(&record.signer_prev_hash)
                .is_some_and(|prev| prev.signer_id == record.signer_id)
        };
        if !signer_link_ok {
            flags.push(ChainFlag::PossibleDesync {
                link: ChainLink::SignerPrevious,
            });
        }

        // 6. Opponent back-link
        let opponent_link_ok = record.opponent_prev_hash == self.genesis
            || self.state.local_records.contains_key(&record.opponent_prev_hash);
        if !opponent_link_ok {
            flags.push(ChainFlag::PossibleDesync {
                link: ChainLink::OpponentPrevious,
            });
        }

        // 7. Store
        self.state.high_water.insert(record.signer_id, record.sequence);
        self.state.remote_sequence = record.sequence;
        self.state.last_remote_hash = computed;
        self.state.remote_records.insert(computed, record.clone());

        if flags.is_empty() {
            debug!(
                subsystem = "cf-01",
                signer = %short_hex(&record.signer_id),
                sequence = record.sequence,
                hash = %short_hex(&computed),
                "Admitted remote record"
            );
        } else {
            warn!(
                subsystem = "cf-01",
                signer = %short_hex(&record.signer_id),
                sequence = record.sequence,
                flags = ?flags,
                "Admitted remote record with flags"
            );
        }

        ValidationResult::accepted(record, flags)
    }

    fn combined_history(&self) -> Vec<SignedRecord<P>> {
        let mut all: Vec<SignedRecord<P>> = self
            .state
            .local_records
            .values()
            .chain(self.state.remote_records.values())
            .cloned()
            .collect();
        all.sort_by(|a, b| {
            (a.timestamp, a.sequence, a.signer_id).cmp(&(b.timestamp, b.sequence, b.signer_id))
        });
        all
    }

    fn export_chain(&self) -> ChainExport<P> {
        let by_sequence = |records: &std::collections::HashMap<Hash, SignedRecord<P>>| {
            let mut out: Vec<SignedRecord<P>> = records.values().cloned().collect();
            out.sort_by_key(|r| r.sequence);
            out
        };
        ChainExport {
            genesis: self.genesis,
            local_identity: self.local_identity,
            local_records: by_sequence(&self.state.local_records),
            remote_records: by_sequence(&self.state.remote_records),
        }
    }

    fn state(&self) -> &ChainState<P> {
        &self.state
    }
}
