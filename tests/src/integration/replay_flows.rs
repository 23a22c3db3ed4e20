//! # Replay Flows
//!
//! Record a real match between two drivers, then play the history back.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cf_02_state_sync::Fighter;
    use cf_03_replay::{history_from_json, HistoryEntry, ReplayConfig, ReplayPlayer};
    use session_runtime::{SessionReport, SyncMode};
    use shared_types::Side;
    use tokio::time::Instant;

    use crate::fixtures::driver_pair;

    /// Two seconds of a match where player 1 walks right and player 2 is hit
    /// twice. Returns the acceptor's report.
    async fn recorded_match(id: &str) -> SessionReport {
        let (a, b, _a_end, _b_end) = driver_pair(id, SyncMode::TrustMinimized);
        let a = a.with_frame_hook(|fighter, _now| fighter.position.x += 1.5);
        let mut hits = 0u32;
        let mut next_hit: Option<u64> = None;
        let b = b.with_frame_hook(move |fighter, now| {
            let due = *next_hit.get_or_insert(now + 600);
            if now >= due && hits < 2 {
                fighter.take_hit();
                hits += 1;
                next_hit = Some(now + 600);
            }
        });
        let a_handle = a.handle();

        let a_task = tokio::spawn(a.run());
        let b_task = tokio::spawn(b.run());
        tokio::time::sleep(Duration::from_secs(2)).await;
        a_handle.close();
        b_task.await.unwrap().unwrap();
        a_task.await.unwrap().unwrap()
    }

    fn last_of(history: &[HistoryEntry], side: Side) -> &HistoryEntry {
        history.iter().rev().find(|e| e.side == side).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorded_history_is_ordered_and_covers_both_sides() {
        let report = recorded_match("replay-1").await;
        let history = &report.history;

        assert!(history.iter().any(|e| e.side == Side::Primary));
        assert!(history.iter().any(|e| e.side == Side::Secondary));
        assert!(history
            .windows(2)
            .all(|w| (w[0].timestamp, w[0].sequence) <= (w[1].timestamp, w[1].sequence)));

        // Local entries carry the sequences of the records that were signed.
        let signed: Vec<u64> = report.chain.local_records.iter().map(|r| r.sequence).collect();
        let recorded: Vec<u64> = history
            .iter()
            .filter(|e| e.side == Side::Primary)
            .map(|e| e.sequence)
            .collect();
        assert_eq!(recorded, signed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_reaches_final_recorded_state() {
        let report = recorded_match("replay-2").await;
        let expected_p1 = last_of(&report.history, Side::Primary).snapshot.clone();
        let expected_p2 = last_of(&report.history, Side::Secondary).snapshot.clone();

        let mut player = ReplayPlayer::new(report.history.clone(), ReplayConfig::for_testing()).unwrap();
        let result = player.run(5.0).await;

        assert_eq!(result.applied, report.history.len());
        assert_eq!(result.primary.position, expected_p1.position);
        assert_eq!(result.secondary.health, expected_p2.health);
        assert_eq!(result.secondary.health(), 60);
        assert!(!result.secondary.is_dead());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_speed_replays_in_half_the_time() {
        let report = recorded_match("replay-3").await;
        let entries = report.history.len() as u32;
        let mut player = ReplayPlayer::new(report.history, ReplayConfig::for_testing()).unwrap();

        let start = Instant::now();
        player.run(1.0).await;
        let normal = start.elapsed();

        let start = Instant::now();
        player.run(2.0).await;
        let fast = start.elapsed();

        // 10 entries per second at speed 1.0, within timer granularity.
        let expected = 0.1 * f64::from(entries);
        assert!((normal.as_secs_f64() - expected).abs() < expected * 0.02, "{normal:?}");
        let ratio = normal.as_secs_f64() / fast.as_secs_f64();
        assert!((ratio - 2.0).abs() < 0.1, "ratio {ratio}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_survives_json_export() {
        let report = recorded_match("replay-4").await;
        let json = serde_json::to_string(&report.history).unwrap();
        let restored = history_from_json(&json).unwrap();
        assert_eq!(restored, report.history);

        let mut player = ReplayPlayer::new(restored, ReplayConfig::for_testing()).unwrap();
        while player.step().is_some() {}
        assert_eq!(player.remaining(), 0);
        assert_eq!(
            player.primary().position,
            last_of(&report.history, Side::Primary).snapshot.position
        );
    }
}
