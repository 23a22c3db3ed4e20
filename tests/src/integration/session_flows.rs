//! # Session Flows
//!
//! Two [`SessionDriver`](session_runtime::SessionDriver)s play complete
//! matches over a memory channel under paused tokio time. Adversarial
//! variants wrap the channel or the signer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cf_01_chain_validation::{LocalKeySigner, RecordSigner, SignerError};
use session_runtime::{MemoryTransport, TransportChannel};
use shared_types::{wire, Address, EcdsaSignature, Hash, PeerMessage, TransportError};

/// Channel end that rewrites every `every`-th signed record it sends after
/// the signature was taken.
pub struct TamperingTransport {
    inner: MemoryTransport,
    every: u64,
    seen: AtomicU64,
}

impl TamperingTransport {
    pub fn new(inner: MemoryTransport, every: u64) -> Self {
        Self {
            inner,
            every: every.max(1),
            seen: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl TransportChannel for TamperingTransport {
    async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        let Ok(PeerMessage::SignedState { mut record }) = wire::decode(&frame) else {
            return self.inner.send(frame).await;
        };
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.every != 0 {
            return self.inner.send(frame).await;
        }
        record.payload.position.x += 120.0;
        let forged = wire::encode(&PeerMessage::SignedState { record })
            .map_err(|e| TransportError::Failed(e.to_string()))?;
        self.inner.send(forged).await
    }

    fn close(&self) {
        self.inner.close();
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// Signer that refuses every `every`-th request.
pub struct FlakySigner {
    inner: LocalKeySigner,
    every: u64,
    calls: AtomicU64,
}

impl FlakySigner {
    pub fn new(every: u64) -> Self {
        Self {
            inner: LocalKeySigner::random(),
            every: every.max(1),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSigner for FlakySigner {
    fn identity(&self) -> Address {
        self.inner.identity()
    }

    async fn sign_digest(&self, digest: Hash) -> Result<EcdsaSignature, SignerError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.every == 0 {
            return Err(SignerError::Rejected("user dismissed the prompt".into()));
        }
        self.inner.sign_digest(digest).await
    }
}

pub fn as_channel(end: MemoryTransport) -> Arc<dyn TransportChannel> {
    Arc::new(end)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cf_01_chain_validation::{ChainFlag, RecordRejection};
    use cf_02_state_sync::{Fighter, MatchOutcome};
    use session_runtime::{Session, SessionConfig, SessionDriver, SessionEvent, SyncMode};
    use shared_types::Side;

    use super::*;
    use crate::fixtures::{drain, driver_pair, session};

    fn trust_warnings(events: &[SessionEvent]) -> Vec<RecordRejection> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::TrustWarning { rejection } => Some(*rejection),
                _ => None,
            })
            .collect()
    }

    // =============================================================================
    // FULL MATCHES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_knockout_ends_match_on_both_sides() {
        let (a, b, _a_end, _b_end) = driver_pair("flow-knockout", SyncMode::TrustMinimized);
        let mut a = a.with_frame_hook(|fighter, _now| {
            if !fighter.is_attacking {
                fighter.attack();
            }
        });
        let mut next_hit: Option<u64> = None;
        let mut b = b.with_frame_hook(move |fighter, now| {
            let due = *next_hit.get_or_insert(now + 300);
            if now >= due {
                fighter.take_hit();
                next_hit = Some(now + 300);
            }
        });
        let mut a_events = a.subscribe();
        let mut b_events = b.subscribe();
        let a_handle = a.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());

        // Five hits land well inside the five second match.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        a_handle.close();

        let a_report = a_task.await.unwrap().unwrap();
        let b_report = b_task.await.unwrap().unwrap();

        let expected = Some(MatchOutcome::Winner(Side::Primary));
        assert_eq!(a_report.outcome, expected);
        assert_eq!(b_report.outcome, expected);

        let a_events = drain(&mut a_events);
        let b_events = drain(&mut b_events);
        assert!(trust_warnings(&a_events).is_empty());
        assert!(trust_warnings(&b_events).is_empty());
        assert!(b_events.iter().any(|e| matches!(e, SessionEvent::MatchEnded { .. })));

        // A saw B's final state, death included.
        assert!(a_report
            .history
            .iter()
            .any(|e| e.side == Side::Secondary && e.snapshot.dead));
        assert!(a_report
            .history
            .iter()
            .any(|e| e.side == Side::Primary && e.snapshot.is_attacking));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_decides_untouched_match_as_tie() {
        let (mut a, b, _a_end, _b_end) = driver_pair("flow-timer", SyncMode::TrustMinimized);
        let mut a_events = a.subscribe();
        let a_handle = a.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        a_handle.close();
        let a_report = a_task.await.unwrap().unwrap();
        let b_report = b_task.await.unwrap().unwrap();

        assert_eq!(a_report.outcome, Some(MatchOutcome::Tie));
        assert_eq!(b_report.outcome, Some(MatchOutcome::Tie));
        assert!(drain(&mut a_events).contains(&SessionEvent::MatchEnded {
            outcome: MatchOutcome::Tie
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_mode_syncs_without_chain() {
        let (a, b, _a_end, _b_end) = driver_pair("flow-raw", SyncMode::Raw);
        let a = a.with_frame_hook(|fighter, _now| fighter.position.x += 2.0);
        let a_handle = a.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());
        tokio::time::sleep(Duration::from_secs(1)).await;
        a_handle.close();

        let a_report = a_task.await.unwrap().unwrap();
        let b_report = b_task.await.unwrap().unwrap();

        assert!(a_report.chain.local_records.is_empty());
        assert!(b_report.chain.remote_records.is_empty());
        let moved = b_report
            .history
            .iter()
            .filter(|e| e.side == Side::Primary)
            .map(|e| e.snapshot.position.x)
            .fold(0.0_f64, f64::max);
        assert!(moved > 250.0, "opponent never moved: {moved}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_modes_report_protocol_violations() {
        let ((a_end, a_rx), (b_end, b_rx)) = MemoryTransport::pair();
        let a = SessionDriver::new(
            session("flow-mixed", SyncMode::TrustMinimized),
            as_channel(a_end),
            a_rx,
            true,
        );
        let mut b = SessionDriver::new(session("flow-mixed", SyncMode::Raw), as_channel(b_end), b_rx, false);
        let mut b_events = b.subscribe();
        let a_handle = a.handle();

        tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());
        tokio::time::sleep(Duration::from_millis(500)).await;
        a_handle.close();
        let b_report = b_task.await.unwrap().unwrap();

        assert!(b_report.history.iter().all(|e| e.side == Side::Secondary));
        assert!(drain(&mut b_events)
            .iter()
            .any(|e| matches!(e, SessionEvent::ProtocolViolation { .. })));
    }

    // =============================================================================
    // ADVERSARIAL CHANNEL AND SIGNER
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_tampered_records_raise_trust_warnings() {
        let ((a_end, a_rx), (b_end, b_rx)) = MemoryTransport::pair();
        let a = SessionDriver::new(
            session("flow-tamper", SyncMode::TrustMinimized),
            Arc::new(TamperingTransport::new(a_end, 3)),
            a_rx,
            true,
        );
        let mut b = SessionDriver::new(
            session("flow-tamper", SyncMode::TrustMinimized),
            as_channel(b_end),
            b_rx,
            false,
        );
        let mut b_events = b.subscribe();
        let a_handle = a.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());
        tokio::time::sleep(Duration::from_secs(1)).await;
        a_handle.close();
        let a_report = a_task.await.unwrap().unwrap();
        let b_report = b_task.await.unwrap().unwrap();

        let events = drain(&mut b_events);
        let warnings = trust_warnings(&events);
        assert!(!warnings.is_empty());
        assert!(warnings.iter().all(|r| *r == RecordRejection::HashMismatch));

        // Forged records never reach the admitted chain or the history.
        assert!(b_report
            .chain
            .remote_records
            .iter()
            .all(|r| a_report.chain.local_records.contains(r)));
        assert!(b_report
            .history
            .iter()
            .filter(|e| e.side == Side::Primary)
            .all(|e| e.snapshot.position.x < 300.0));
        // Each dropped record leaves a gap behind it.
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::ChainFlagged { flag: ChainFlag::SequenceGap { .. } })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_signer_skips_ticks_without_breaking_chain() {
        let ((a_end, a_rx), (b_end, b_rx)) = MemoryTransport::pair();
        let signer = Arc::new(FlakySigner::new(4));
        let a_session = Session::new(
            SessionConfig::for_testing("flow-flaky"),
            Arc::clone(&signer) as Arc<dyn RecordSigner>,
        )
        .unwrap();
        let mut a = SessionDriver::new(a_session, as_channel(a_end), a_rx, true);
        let mut b = SessionDriver::new(
            session("flow-flaky", SyncMode::TrustMinimized),
            as_channel(b_end),
            b_rx,
            false,
        );
        let mut a_events = a.subscribe();
        let mut b_events = b.subscribe();
        let a_handle = a.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());
        tokio::time::sleep(Duration::from_secs(2)).await;
        a_handle.close();
        let a_report = a_task.await.unwrap().unwrap();
        let b_report = b_task.await.unwrap().unwrap();

        assert!(signer.calls() >= 8);
        let failures = drain(&mut a_events)
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::SignerFailed { .. }))
            .count();
        assert!(failures >= 2);

        // Sequences stay dense and every link resolves.
        let records = &a_report.chain.local_records;
        let mut prev = a_report.chain.genesis;
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.sequence, i as u64 + 1);
            assert_eq!(record.signer_prev_hash, prev);
            prev = record.hash;
        }
        assert!(!b_report.chain.remote_records.is_empty());
        assert!(!drain(&mut b_events)
            .iter()
            .any(|e| matches!(e, SessionEvent::ChainFlagged { .. } | SessionEvent::TrustWarning { .. })));
    }

    // =============================================================================
    // RESTART
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_one_sided_restart_severs_until_peer_follows() {
        let (mut a, b, _a_end, _b_end) = driver_pair("flow-restart", SyncMode::TrustMinimized);
        let mut a_events = a.subscribe();
        let a_handle = a.handle();
        let b_handle = b.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(b_handle.restart());
        tokio::time::sleep(Duration::from_millis(500)).await;

        let before = drain(&mut a_events);
        assert!(trust_warnings(&before).contains(&RecordRejection::SignatureInvalid));

        assert!(a_handle.restart());
        tokio::time::sleep(Duration::from_millis(10)).await;
        drain(&mut a_events);
        tokio::time::sleep(Duration::from_millis(500)).await;

        let after = drain(&mut a_events);
        assert!(trust_warnings(&after).is_empty(), "{after:?}");

        a_handle.close();
        let a_report = a_task.await.unwrap().unwrap();
        let b_report = b_task.await.unwrap().unwrap();
        assert_eq!(a_report.round, 2);
        assert_eq!(b_report.round, 2);
        assert!(!a_report.chain.remote_records.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_keeps_admitted_records() {
        let (a, mut b, a_end, _b_end) = driver_pair("flow-close", SyncMode::TrustMinimized);
        let mut b_events = b.subscribe();

        tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());
        tokio::time::sleep(Duration::from_millis(700)).await;
        a_end.close();

        let b_report = b_task.await.unwrap().unwrap();
        assert!(!b_report.chain.remote_records.is_empty());
        assert!(drain(&mut b_events).contains(&SessionEvent::Disconnected));
    }
}
