//! # Chain Flows
//!
//! Two [`ChainPeer`](crate::fixtures::ChainPeer)s sign and admit each
//! other's records directly, exercising the cross-linked chains end to end.

#[cfg(test)]
mod tests {
    use cf_01_chain_validation::{
        genesis_hash, ChainFlag, ChainLink, ChainValidationApi, RecordRejection,
    };
    use shared_types::{InputFrame, InputKey, PlayerStateSnapshot, Side};

    use crate::fixtures::{snapshot, ChainPeer, SESSION_ID, T0};

    fn pair() -> (ChainPeer, ChainPeer) {
        (ChainPeer::new(SESSION_ID, 1), ChainPeer::new(SESSION_ID, 1))
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_first_records_link_to_shared_genesis() {
        let (mut a, mut b) = pair();
        let genesis = genesis_hash(SESSION_ID, 1);
        assert_eq!(a.chain.genesis(), b.chain.genesis());

        let a1 = a.sign(snapshot(Side::Primary, T0), T0).await;
        assert_eq!(a1.sequence, 1);
        assert_eq!(a1.signer_prev_hash, genesis);
        assert_eq!(a1.opponent_prev_hash, genesis);

        let result = b.chain.validate_and_store(a1.clone());
        assert!(result.valid);
        assert!(result.flags.is_empty());

        // B's first record points at what it has seen from A.
        let b1 = b.sign(snapshot(Side::Secondary, T0 + 10), T0 + 10).await;
        assert_eq!(b1.signer_prev_hash, genesis);
        assert_eq!(b1.opponent_prev_hash, a1.hash);

        let result = a.chain.validate_and_store(b1);
        assert!(result.valid);
        assert!(result.flags.is_empty());
    }

    #[tokio::test]
    async fn test_alternating_exchange_converges() {
        let (mut a, mut b) = pair();

        for i in 0..20u64 {
            let ts = T0 + i * 33;
            let from_a = a.sign(snapshot(Side::Primary, ts), ts).await;
            let verdict = b.chain.validate_and_store(from_a);
            assert!(verdict.valid && verdict.flags.is_empty(), "a#{i}: {verdict:?}");

            let from_b = b.sign(snapshot(Side::Secondary, ts + 1), ts + 1).await;
            let verdict = a.chain.validate_and_store(from_b);
            assert!(verdict.valid && verdict.flags.is_empty(), "b#{i}: {verdict:?}");
        }

        let a_export = a.chain.export_chain();
        let b_export = b.chain.export_chain();
        assert_eq!(a_export.local_records, b_export.remote_records);
        assert_eq!(b_export.local_records, a_export.remote_records);
        assert_eq!(a.chain.state().last_local_hash, b.chain.state().last_remote_hash);

        // Each chain walks back to genesis.
        let mut expected_prev = a_export.genesis;
        for record in &a_export.local_records {
            assert_eq!(record.signer_prev_hash, expected_prev);
            expected_prev = record.hash;
        }
    }

    #[tokio::test]
    async fn test_combined_history_interleaves_both_chains() {
        let (mut a, mut b) = pair();
        let a1 = a.sign(snapshot(Side::Primary, T0), T0).await;
        b.chain.validate_and_store(a1);
        let b1 = b.sign(snapshot(Side::Secondary, T0 + 5), T0 + 5).await;
        a.chain.validate_and_store(b1);
        let a2 = a.sign(snapshot(Side::Primary, T0 + 10), T0 + 10).await;
        b.chain.validate_and_store(a2);

        let history = b.chain.combined_history();
        let stamps: Vec<u64> = history.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![T0, T0 + 5, T0 + 10]);
        assert_eq!(history[1].signer_id, b.chain.local_identity());
    }

    #[tokio::test]
    async fn test_input_frames_chain_like_snapshots() {
        let mut a: ChainPeer<InputFrame> = ChainPeer::new(SESSION_ID, 1);
        let mut b: ChainPeer<InputFrame> = ChainPeer::new(SESSION_ID, 1);

        let frame = InputFrame {
            keys: vec![InputKey::Right, InputKey::Attack],
            timestamp: T0,
        };
        let record = a.sign(frame.clone(), T0).await;
        let result = b.chain.validate_and_store(record);
        assert!(result.valid);
        assert_eq!(result.payload(), Some(&frame));
        assert!(result.payload().is_some_and(|f| f.is_pressed(InputKey::Attack)));
    }

    // =============================================================================
    // FLAGGED BUT ADMITTED
    // =============================================================================

    #[tokio::test]
    async fn test_lost_record_flags_gap_and_desync() {
        let (mut a, mut b) = pair();
        let a1 = a.sign(snapshot(Side::Primary, T0), T0).await;
        let _lost = a.sign(snapshot(Side::Primary, T0 + 33), T0 + 33).await;
        let a3 = a.sign(snapshot(Side::Primary, T0 + 66), T0 + 66).await;

        assert!(b.chain.validate_and_store(a1).valid);
        let result = b.chain.validate_and_store(a3);
        assert!(result.valid);
        assert_eq!(
            result.flags,
            vec![
                ChainFlag::SequenceGap {
                    expected: 2,
                    received: 3
                },
                ChainFlag::PossibleDesync {
                    link: ChainLink::SignerPrevious
                },
            ]
        );
        assert_eq!(b.chain.state().max_seen(&a.chain.local_identity()), 3);
    }

    #[tokio::test]
    async fn test_unknown_opponent_link_flags_desync() {
        let (mut a, mut b) = pair();
        let b1 = b.sign(snapshot(Side::Secondary, T0), T0).await;
        a.chain.validate_and_store(b1);
        // C shares the genesis but never saw b1.
        let mut c: ChainPeer = ChainPeer::new(SESSION_ID, 1);

        let a1 = a.sign(snapshot(Side::Primary, T0 + 10), T0 + 10).await;
        let result = c.chain.validate_and_store(a1);
        assert!(result.valid);
        assert_eq!(
            result.flags,
            vec![ChainFlag::PossibleDesync {
                link: ChainLink::OpponentPrevious
            }]
        );
    }

    // =============================================================================
    // REJECTED
    // =============================================================================

    #[tokio::test]
    async fn test_duplicate_delivery_is_regression() {
        let (mut a, mut b) = pair();
        let a1 = a.sign(snapshot(Side::Primary, T0), T0).await;
        assert!(b.chain.validate_and_store(a1.clone()).valid);

        let again = b.chain.validate_and_store(a1);
        assert_eq!(
            again.rejection,
            Some(RecordRejection::SequenceRegression {
                sequence: 1,
                max_seen: 1
            })
        );
        assert_eq!(b.chain.state().remote_records.len(), 1);
    }

    #[tokio::test]
    async fn test_other_session_records_do_not_verify() {
        let mut a: ChainPeer = ChainPeer::new("session-a", 1);
        let mut b: ChainPeer = ChainPeer::new("session-b", 1);

        let record = a.sign(snapshot(Side::Primary, T0), T0).await;
        let result = b.chain.validate_and_store(record);
        assert!(!result.valid);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));
        assert!(b.chain.state().remote_records.is_empty());
    }

    #[tokio::test]
    async fn test_previous_round_records_do_not_verify() {
        let mut old_round: ChainPeer = ChainPeer::new(SESSION_ID, 1);
        let mut new_round: ChainPeer = ChainPeer::new(SESSION_ID, 2);

        let record = old_round.sign(snapshot(Side::Primary, T0), T0).await;
        let result = new_round.chain.validate_and_store(record);
        assert_eq!(result.rejection, Some(RecordRejection::SignatureInvalid));
    }

    #[tokio::test]
    async fn test_rejected_record_leaves_state_untouched() {
        let (mut a, mut b) = pair();
        let a1 = a.sign(snapshot(Side::Primary, T0), T0).await;
        b.chain.validate_and_store(a1);
        let before = b.chain.export_chain();

        let mut forged = a.sign(snapshot(Side::Primary, T0 + 33), T0 + 33).await;
        forged.payload = PlayerStateSnapshot {
            health: 100,
            ..forged.payload
        };
        forged.payload.position.x += 50.0;
        let result = b.chain.validate_and_store(forged);

        assert!(!result.valid);
        assert_eq!(b.chain.export_chain(), before);
    }
}
