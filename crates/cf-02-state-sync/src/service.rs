//! # State Sync Engine
//!
//! Captures the local fighter at a fixed rate and reconciles received
//! snapshots into the opponent.
//!
//! ## Reconciliation Rules
//!
//! - Position, velocity and facing are written directly
//! - The sprite is switched only when it differs
//! - `attack()` fires only on a false→true edge of `is_attacking`
//! - Health is a ratchet: it may only go down until the next `init_game`
//! - Health reaching zero kills the opponent exactly once
//!
//! The ratchet means a stale or hostile snapshot can never heal the opponent.

use shared_types::{PlayerStateSnapshot, Side, MAX_HEALTH};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::domain::{canonical_start, MatchOutcome, SyncError};
use crate::ports::Fighter;

/// What applying one remote snapshot did to the opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    /// Opponent health after the ratchet.
    pub health: u8,
    /// The snapshot claimed more health than the ratchet allows.
    pub health_clamped: bool,
    /// This snapshot killed the opponent.
    pub died: bool,
}

/// Per-match synchronization state.
#[derive(Debug, Clone)]
pub struct StateSyncEngine {
    config: SyncConfig,
    side: Option<Side>,
    game_start: Option<u64>,
    last_emit: Option<u64>,
    emitted: u64,
    /// Lowest opponent health seen this round.
    opponent_health: u8,
    /// `is_attacking` of the last applied snapshot.
    remote_attacking: bool,
}

impl StateSyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            side: None,
            game_start: None,
            last_emit: None,
            emitted: 0,
            opponent_health: MAX_HEALTH,
            remote_attacking: false,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Side the local peer controls, once the game is initialized.
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    /// Snapshots emitted since `init_game`.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Lowest opponent health seen since `init_game`.
    pub fn opponent_health(&self) -> u8 {
        self.opponent_health
    }

    /// Reset counters, ratchet and clock, and place both fighters at their
    /// canonical start.
    pub fn init_game<L, O>(&mut self, side: Side, now: u64, local: &mut L, opponent: &mut O)
    where
        L: Fighter + ?Sized,
        O: Fighter + ?Sized,
    {
        local.reset_to(&canonical_start(side, now));
        opponent.reset_to(&canonical_start(side.opposite(), now));

        self.side = Some(side);
        self.game_start = Some(now);
        self.last_emit = None;
        self.emitted = 0;
        self.opponent_health = MAX_HEALTH;
        self.remote_attacking = false;

        info!(
            subsystem = "cf-02",
            side = side.label(),
            start = now,
            "Game initialized"
        );
    }

    /// Read the local fighter into a snapshot.
    pub fn capture_local_snapshot<F: Fighter + ?Sized>(&self, entity: &F, now: u64) -> PlayerStateSnapshot {
        PlayerStateSnapshot {
            position: entity.position(),
            velocity: entity.velocity(),
            health: entity.health(),
            facing_left: entity.facing_left(),
            is_attacking: entity.is_attacking(),
            current_sprite: entity.current_sprite(),
            dead: entity.is_dead(),
            timestamp: now,
        }
    }

    /// True when an emission is due; stamps it as emitted.
    pub fn should_emit(&mut self, now: u64) -> bool {
        let due = match self.last_emit {
            None => true,
            Some(last) => now.saturating_sub(last) as f64 >= self.config.emit_interval_ms(),
        };
        if due {
            self.last_emit = Some(now);
            self.emitted += 1;
        }
        due
    }

    /// Reconcile a received snapshot into the opponent fighter.
    pub fn apply_remote_snapshot<F: Fighter + ?Sized>(
        &mut self,
        snapshot: &PlayerStateSnapshot,
        opponent: &mut F,
    ) -> ApplyReport {
        opponent.set_position(snapshot.position);
        opponent.set_velocity(snapshot.velocity);
        opponent.set_facing_left(snapshot.facing_left);

        if opponent.current_sprite() != snapshot.current_sprite {
            opponent.switch_sprite(snapshot.current_sprite);
        }

        if snapshot.is_attacking && !self.remote_attacking {
            opponent.attack();
        } else if !snapshot.is_attacking {
            opponent.set_attacking(false);
        }
        self.remote_attacking = snapshot.is_attacking;

        let health_clamped = snapshot.health > self.opponent_health;
        self.opponent_health = self.opponent_health.min(snapshot.health);
        opponent.set_health(self.opponent_health);

        let died = self.opponent_health == 0 && !opponent.is_dead();
        if died {
            opponent.mark_dead();
            info!(subsystem = "cf-02", "Opponent defeated");
        }

        if health_clamped {
            debug!(
                subsystem = "cf-02",
                claimed = snapshot.health,
                kept = self.opponent_health,
                "Ignored health increase from remote snapshot"
            );
        }

        ApplyReport {
            health: self.opponent_health,
            health_clamped,
            died,
        }
    }

    /// Milliseconds since `init_game`; 0 before it.
    pub fn elapsed_game_time(&self, now: u64) -> u64 {
        self.game_start.map_or(0, |start| now.saturating_sub(start))
    }

    /// Whole seconds left of a `total_seconds` match.
    pub fn remaining_time(&self, now: u64, total_seconds: u64) -> u64 {
        total_seconds.saturating_sub(self.elapsed_game_time(now) / 1000)
    }

    /// Outcome once the timer ran out or a fighter died; `None` while the
    /// match is still running.
    pub fn match_outcome<L, O>(&self, now: u64, local: &L, opponent: &O) -> Result<Option<MatchOutcome>, SyncError>
    where
        L: Fighter + ?Sized,
        O: Fighter + ?Sized,
    {
        let side = self.side.ok_or(SyncError::NotInitialized)?;
        let time_up = self.remaining_time(now, self.config.match_duration_secs) == 0;
        if !time_up && !local.is_dead() && !opponent.is_dead() {
            return Ok(None);
        }

        let (primary, secondary) = match side {
            Side::Primary => (local.health(), opponent.health()),
            Side::Secondary => (opponent.health(), local.health()),
        };
        Ok(Some(MatchOutcome::decide(primary, secondary)))
    }
}
