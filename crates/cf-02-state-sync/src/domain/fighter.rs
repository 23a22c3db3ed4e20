//! # Fighter State
//!
//! Concrete fighter with the game's combat rules. Used for the local
//! fighter in headless sessions and for replay.

use shared_types::{PlayerStateSnapshot, Side, SpriteKind, Vec2, MAX_HEALTH};

use crate::ports::Fighter;

/// Damage of one landed hit.
pub const HIT_DAMAGE: u8 = 20;

/// Where player 1 starts.
pub const PRIMARY_START: Vec2 = Vec2::new(200.0, 330.0);

/// Where player 2 starts.
pub const SECONDARY_START: Vec2 = Vec2::new(700.0, 330.0);

/// Canonical start-of-round snapshot for a side.
///
/// Player 1 faces right, player 2 faces left; both idle at full health.
#[must_use]
pub fn canonical_start(side: Side, timestamp: u64) -> PlayerStateSnapshot {
    let (position, facing_left) = match side {
        Side::Primary => (PRIMARY_START, false),
        Side::Secondary => (SECONDARY_START, true),
    };
    PlayerStateSnapshot {
        position,
        velocity: Vec2::default(),
        health: MAX_HEALTH,
        facing_left,
        is_attacking: false,
        current_sprite: SpriteKind::Idle,
        dead: false,
        timestamp,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FighterState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: u8,
    pub facing_left: bool,
    pub is_attacking: bool,
    pub sprite: SpriteKind,
    pub dead: bool,
}

impl FighterState {
    /// A fighter at the canonical start of `side`.
    #[must_use]
    pub fn new(side: Side) -> Self {
        let mut fighter = Self {
            position: Vec2::default(),
            velocity: Vec2::default(),
            health: MAX_HEALTH,
            facing_left: false,
            is_attacking: false,
            sprite: SpriteKind::Idle,
            dead: false,
        };
        fighter.reset_to(&canonical_start(side, 0));
        fighter
    }
}

impl Fighter for FighterState {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn health(&self) -> u8 {
        self.health
    }

    fn facing_left(&self) -> bool {
        self.facing_left
    }

    fn is_attacking(&self) -> bool {
        self.is_attacking
    }

    fn current_sprite(&self) -> SpriteKind {
        self.sprite
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn set_facing_left(&mut self, facing_left: bool) {
        self.facing_left = facing_left;
    }

    fn set_health(&mut self, health: u8) {
        self.health = health.min(MAX_HEALTH);
    }

    fn set_attacking(&mut self, attacking: bool) {
        self.is_attacking = attacking;
    }

    fn switch_sprite(&mut self, sprite: SpriteKind) {
        if self.sprite == SpriteKind::Death {
            return;
        }
        self.sprite = sprite;
    }

    fn attack(&mut self) {
        self.switch_sprite(SpriteKind::Attack);
        self.is_attacking = true;
    }

    fn take_hit(&mut self) {
        self.health = self.health.saturating_sub(HIT_DAMAGE);
        if self.health == 0 {
            if !self.dead {
                self.switch_sprite(SpriteKind::Death);
                self.dead = true;
            }
        } else {
            self.switch_sprite(SpriteKind::TakeHit);
        }
    }

    fn mark_dead(&mut self) {
        self.switch_sprite(SpriteKind::Death);
        self.dead = true;
    }

    fn reset_to(&mut self, snapshot: &PlayerStateSnapshot) {
        self.position = snapshot.position;
        self.velocity = snapshot.velocity;
        self.health = snapshot.health.min(MAX_HEALTH);
        self.facing_left = snapshot.facing_left;
        self.is_attacking = snapshot.is_attacking;
        self.sprite = snapshot.current_sprite;
        self.dead = snapshot.dead;
    }
}
