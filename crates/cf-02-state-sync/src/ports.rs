//! # Ports
//!
//! The fighter entity contract. Rendering, physics and input handling live
//! behind it; this subsystem only reads and writes the fields a snapshot
//! carries.

use shared_types::{PlayerStateSnapshot, SpriteKind, Vec2};

/// A fighter the sync engine can read from and write to.
pub trait Fighter {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn health(&self) -> u8;
    fn facing_left(&self) -> bool;
    fn is_attacking(&self) -> bool;
    fn current_sprite(&self) -> SpriteKind;
    fn is_dead(&self) -> bool;

    fn set_position(&mut self, position: Vec2);
    fn set_velocity(&mut self, velocity: Vec2);
    fn set_facing_left(&mut self, facing_left: bool);
    fn set_health(&mut self, health: u8);
    fn set_attacking(&mut self, attacking: bool);

    /// Change the animation. Ignored once the death animation is showing.
    fn switch_sprite(&mut self, sprite: SpriteKind);

    /// Start an attack: attack animation plus the attacking flag.
    fn attack(&mut self);

    /// Take one hit: lose [`crate::HIT_DAMAGE`] health, dying once at zero.
    fn take_hit(&mut self);

    /// Enter the dead state. Idempotent.
    fn mark_dead(&mut self);

    /// Overwrite every field from a snapshot, bypassing animation rules.
    fn reset_to(&mut self, snapshot: &PlayerStateSnapshot);
}
