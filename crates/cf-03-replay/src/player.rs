//! # Replay Player
//!
//! Re-drives a recorded history through the same reconciliation path the
//! live session uses, against two fresh fighters at their canonical start.
//!
//! Pacing: entry `k` is applied one tick after entry `k - 1`, where a tick is
//! `1000 / (target_ticks_per_second * speed)` ms. Pausing stops the clock;
//! resuming restarts it from the moment of resume. There is no seek.

use std::sync::Arc;
use std::time::Duration;

use cf_02_state_sync::{FighterState, StateSyncEngine, SyncConfig};
use shared_types::Side;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::ReplayConfig;
use crate::domain::{HistoryEntry, PlaybackControl, ReplayError};

/// Remote control for a running [`ReplayPlayer`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ReplayHandle {
    control: Arc<watch::Sender<PlaybackControl>>,
    config: Arc<ReplayConfig>,
}

impl ReplayHandle {
    pub fn pause(&self) {
        self.control.send_modify(|c| c.paused = true);
    }

    pub fn resume(&self) {
        self.control.send_modify(|c| c.paused = false);
    }

    /// Change speed; returns the clamped value actually applied.
    pub fn set_speed(&self, speed: f64) -> f64 {
        let speed = self.config.clamp_speed(speed);
        self.control.send_modify(|c| c.speed = speed);
        speed
    }

    pub fn is_paused(&self) -> bool {
        self.control.borrow().paused
    }

    pub fn speed(&self) -> f64 {
        self.control.borrow().speed
    }
}

/// Final state of a playback run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// Entries applied.
    pub applied: usize,
    pub primary: FighterState,
    pub secondary: FighterState,
}

/// Plays one history back.
pub struct ReplayPlayer {
    config: ReplayConfig,
    entries: Vec<HistoryEntry>,
    cursor: usize,
    primary: FighterState,
    secondary: FighterState,
    /// Reconciles snapshots into the primary fighter.
    primary_sync: StateSyncEngine,
    /// Reconciles snapshots into the secondary fighter.
    secondary_sync: StateSyncEngine,
    handle: ReplayHandle,
    control: watch::Receiver<PlaybackControl>,
}

impl ReplayPlayer {
    pub fn new(entries: Vec<HistoryEntry>, config: ReplayConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        if entries.is_empty() {
            return Err(ReplayError::EmptyHistory);
        }

        let (tx, control) = watch::channel(PlaybackControl::default());
        let handle = ReplayHandle {
            control: Arc::new(tx),
            config: Arc::new(config.clone()),
        };
        let sync_config = SyncConfig {
            target_ticks_per_second: config.target_ticks_per_second,
            ..SyncConfig::default()
        };

        let mut player = Self {
            config,
            entries,
            cursor: 0,
            primary: FighterState::new(Side::Primary),
            secondary: FighterState::new(Side::Secondary),
            primary_sync: StateSyncEngine::new(sync_config.clone()),
            secondary_sync: StateSyncEngine::new(sync_config),
            handle,
            control,
        };
        player.reset();
        Ok(player)
    }

    /// Handle for pause, resume and speed changes.
    pub fn handle(&self) -> ReplayHandle {
        self.handle.clone()
    }

    pub fn primary(&self) -> &FighterState {
        &self.primary
    }

    pub fn secondary(&self) -> &FighterState {
        &self.secondary
    }

    /// Entries not yet applied.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Put both fighters back at the canonical start and rewind.
    pub fn reset(&mut self) {
        let start = self.entries.first().map_or(0, |e| e.timestamp);
        // Each engine treats the fighter it feeds as its opponent.
        self.primary_sync
            .init_game(Side::Secondary, start, &mut self.secondary, &mut self.primary);
        self.secondary_sync
            .init_game(Side::Primary, start, &mut self.primary, &mut self.secondary);
        self.cursor = 0;
    }

    /// Apply the next entry without waiting. Returns `None` at the end.
    pub fn step(&mut self) -> Option<&HistoryEntry> {
        let entry = self.entries.get(self.cursor)?;
        let report = match entry.side {
            Side::Primary => self
                .primary_sync
                .apply_remote_snapshot(&entry.snapshot, &mut self.primary),
            Side::Secondary => self
                .secondary_sync
                .apply_remote_snapshot(&entry.snapshot, &mut self.secondary),
        };
        if report.died {
            debug!(subsystem = "cf-03", side = entry.side.label(), "Fighter died in replay");
        }
        self.cursor += 1;
        Some(entry)
    }

    fn tick(&self, speed: f64) -> Duration {
        let per_second = f64::from(self.config.target_ticks_per_second) * speed;
        Duration::from_secs_f64(1.0 / per_second)
    }

    /// Play from the start at `speed` until the history is exhausted.
    pub async fn run(&mut self, speed: f64) -> ReplayReport {
        self.reset();
        let speed = self.handle.set_speed(speed);
        info!(
            subsystem = "cf-03",
            entries = self.entries.len(),
            speed,
            "Replay started"
        );

        let mut next = Instant::now() + self.tick(speed);
        while self.cursor < self.entries.len() {
            if self.wait_while_paused().await {
                next = Instant::now() + self.tick(self.handle.speed());
            }

            tokio::select! {
                _ = tokio::time::sleep_until(next) => {
                    self.step();
                    next += self.tick(self.handle.speed());
                }
                _ = self.control.changed() => {
                    // Re-evaluate pause; a speed change applies from the next tick.
                }
            }
        }

        info!(subsystem = "cf-03", applied = self.cursor, "Replay complete");
        ReplayReport {
            applied: self.cursor,
            primary: self.primary.clone(),
            secondary: self.secondary.clone(),
        }
    }

    /// Blocks while paused. Returns whether it had to wait.
    async fn wait_while_paused(&mut self) -> bool {
        let mut waited = false;
        while self.control.borrow_and_update().paused {
            waited = true;
            // The player owns a sender through its handle, so this never closes.
            if self.control.changed().await.is_err() {
                break;
            }
        }
        waited
    }
}
