//! # Chain Attacks
//!
//! | Attack                      | Expected verdict       |
//! |-----------------------------|------------------------|
//! | Replay an admitted record   | `SequenceRegression`   |
//! | Reflect a peer's own record | `SelfSigned`           |
//! | Re-sign under a claimed id  | `SignatureInvalid`     |
//! | High-S twin of a signature  | `SignatureInvalid`     |
//! | Swap the transmitted hash   | `HashMismatch`         |
//! | Edit payload after signing  | `HashMismatch`         |
//! | Rewire a back-link          | `SignatureInvalid`     |

#[cfg(test)]
mod tests {
    use cf_01_chain_validation::domain::ecdsa::invert_s;
    use cf_01_chain_validation::domain::typed_data::{domain_separator, record_hash, signing_digest};
    use cf_01_chain_validation::{
        ChainValidationApi, LocalKeySigner, RecordHeader, RecordPayload, RecordRejection,
        RecordSigner,
    };
    use shared_types::{EcdsaSignature, PlayerStateSnapshot, Side, SignedRecord};

    use crate::fixtures::{snapshot, ChainPeer, SESSION_ID, T0};

    type Record = SignedRecord<PlayerStateSnapshot>;

    /// Recompute the hash so only the signature check can catch the forgery.
    fn rehash(record: &mut Record) {
        let payload_hash = record.payload.payload_hash().unwrap();
        record.hash = record_hash::<PlayerStateSnapshot>(
            &RecordHeader::of(record),
            &payload_hash,
            &record.signature,
        );
    }

    async fn victim_and_record() -> (ChainPeer, ChainPeer, Record) {
        let mut honest: ChainPeer = ChainPeer::new(SESSION_ID, 1);
        let victim: ChainPeer = ChainPeer::new(SESSION_ID, 1);
        let record = honest.sign(snapshot(Side::Primary, T0), T0).await;
        (honest, victim, record)
    }

    #[tokio::test]
    async fn test_replayed_record_rejected_as_regression() {
        let (mut honest, mut victim, first) = victim_and_record().await;
        assert!(victim.chain.validate_and_store(first.clone()).valid);
        let second = honest.sign(snapshot(Side::Primary, T0 + 33), T0 + 33).await;
        assert!(victim.chain.validate_and_store(second).valid);

        let result = victim.chain.validate_and_store(first);
        assert_eq!(
            result.rejection,
            Some(RecordRejection::SequenceRegression {
                sequence: 1,
                max_seen: 2
            })
        );
        assert_eq!(victim.chain.state().remote_records.len(), 2);
    }

    #[tokio::test]
    async fn test_reflected_record_rejected_as_self_signed() {
        let (mut honest, _, record) = victim_and_record().await;
        let result = honest.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::SelfSigned));
        assert!(honest.chain.state().remote_records.is_empty());
    }

    #[tokio::test]
    async fn test_resigned_record_rejected() {
        let (_, mut victim, mut record) = victim_and_record().await;
        let attacker = LocalKeySigner::random();

        // Same header and payload, signed by a key that is not `signer_id`.
        let payload_hash = record.payload.payload_hash().unwrap();
        let digest = signing_digest::<PlayerStateSnapshot>(
            &domain_separator(&victim.chain.genesis()),
            &RecordHeader::of(&record),
            &payload_hash,
        );
        record.signature = attacker.sign_digest(digest).await.unwrap();
        rehash(&mut record);

        let result = victim.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));
    }

    #[tokio::test]
    async fn test_attacker_claiming_victim_identity_rejected() {
        let (_, mut victim, _) = victim_and_record().await;
        let mut attacker: ChainPeer = ChainPeer::new(SESSION_ID, 1);
        let mut record = attacker.sign(snapshot(Side::Secondary, T0), T0).await;

        record.signer_id = victim.chain.local_identity();
        rehash(&mut record);

        let result = victim.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));
    }

    #[tokio::test]
    async fn test_high_s_twin_rejected() {
        let (_, mut victim, mut record) = victim_and_record().await;
        let original = record.signature;
        record.signature = EcdsaSignature {
            r: original.r,
            s: invert_s(&original.s),
            v: original.v ^ 1,
        };
        rehash(&mut record);

        let result = victim.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));
        assert!(victim.chain.state().high_water.is_empty());
    }

    #[tokio::test]
    async fn test_swapped_hash_rejected() {
        let (_, mut victim, mut record) = victim_and_record().await;
        record.hash = [0x42; 32];

        let result = victim.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::HashMismatch));
    }

    #[tokio::test]
    async fn test_payload_edit_after_signing_rejected() {
        let (_, mut victim, mut record) = victim_and_record().await;
        record.payload.health = 100;
        record.payload.position.x = 690.0;

        let result = victim.chain.validate_and_store(record.clone());
        assert_eq!(result.rejection, Some(RecordRejection::HashMismatch));

        // Rehashing does not help: the signature no longer covers the payload.
        rehash(&mut record);
        let result = victim.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));
    }

    #[tokio::test]
    async fn test_rewired_back_link_rejected() {
        let (mut honest, mut victim, first) = victim_and_record().await;
        victim.chain.validate_and_store(first);

        let second = honest.sign(snapshot(Side::Primary, T0 + 33), T0 + 33).await;
        let mut rewired = second.clone();
        rewired.opponent_prev_hash = [0x17; 32];
        rehash(&mut rewired);
        let result = victim.chain.validate_and_store(rewired);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));

        // The untouched original is still admitted afterwards.
        assert!(victim.chain.validate_and_store(second).valid);
    }
}
