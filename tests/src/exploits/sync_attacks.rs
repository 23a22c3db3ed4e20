//! # Sync Attacks
//!
//! A peer lying about its own state, or sending frames that should never
//! reach the session logic.

#[cfg(test)]
mod tests {
    use cf_02_state_sync::{canonical_start, FighterState, StateSyncEngine, SyncConfig};
    use session_runtime::{Session, SessionEvent, SessionPhase, SyncMode};
    use shared_types::{wire, PeerMessage, PlayerStateSnapshot, Side};

    use crate::fixtures::{session, T0};

    /// A raw-mode secondary that has been assigned its role and is fighting.
    fn active_secondary() -> Session {
        let mut s = session("attack-sync", SyncMode::Raw);
        s.connect(false).unwrap();
        s.on_transport_open(T0).unwrap();
        s.handle_message(PeerMessage::RoleAssignment { role: Side::Secondary }, T0)
            .unwrap();
        s.tick(T0);
        assert_eq!(s.phase(), SessionPhase::Active { role: Side::Secondary });
        s.drain_events();
        s
    }

    fn primary_with_health(health: u8, timestamp: u64) -> PlayerStateSnapshot {
        PlayerStateSnapshot {
            health,
            ..canonical_start(Side::Primary, timestamp)
        }
    }

    #[test]
    fn test_health_cannot_be_restored_by_snapshot() {
        let mut engine = StateSyncEngine::new(SyncConfig::for_testing());
        let mut local = FighterState::new(Side::Secondary);
        let mut opponent = FighterState::new(Side::Primary);
        engine.init_game(Side::Secondary, T0, &mut local, &mut opponent);

        engine.apply_remote_snapshot(&primary_with_health(60, T0 + 100), &mut opponent);
        let report = engine.apply_remote_snapshot(&primary_with_health(100, T0 + 200), &mut opponent);

        assert!(report.health_clamped);
        assert_eq!(report.health, 60);
        assert_eq!(opponent.health, 60);
        assert_eq!(engine.opponent_health(), 60);
    }

    #[test]
    fn test_session_ignores_health_inflation() {
        let mut s = active_secondary();
        s.handle_message(PeerMessage::RawState { snapshot: primary_with_health(40, T0 + 100) }, T0 + 100)
            .unwrap();
        s.handle_message(PeerMessage::RawState { snapshot: primary_with_health(100, T0 + 200) }, T0 + 200)
            .unwrap();
        assert_eq!(s.opponent_fighter().health, 40);
    }

    #[test]
    fn test_hostile_frames_become_events() {
        let mut s = active_secondary();

        let garbage = vec![0xFF; 16];
        let oversized = vec![0u8; 70 * 1024];

        let inflated = PeerMessage::RawState {
            snapshot: primary_with_health(250, T0),
        };
        let out_of_range = wire::encode(&inflated).unwrap();

        let mut future_version = wire::encode(&PeerMessage::Ping { time: T0 }).unwrap();
        future_version[0] = future_version[0].wrapping_add(1);

        for frame in [&garbage, &oversized, &out_of_range, &future_version] {
            s.handle_frame(frame, T0 + 10);
        }

        let events = s.drain_events();
        let malformed = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::MalformedFrame { .. }))
            .count();
        assert_eq!(malformed, 4, "{events:?}");
        assert_eq!(s.opponent_fighter().health, 100);
        assert!(s.drain_outbox().iter().all(|m| !matches!(m, PeerMessage::Pong { .. })));
    }

    #[test]
    fn test_role_reassignment_mid_fight_refused() {
        let mut s = active_secondary();
        let frame = wire::encode(&PeerMessage::RoleAssignment { role: Side::Primary }).unwrap();
        s.handle_frame(&frame, T0 + 10);

        assert_eq!(s.role(), Some(Side::Secondary));
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::ProtocolViolation { .. })));
    }
}
