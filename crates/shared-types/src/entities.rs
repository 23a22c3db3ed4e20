//! # Core Domain Entities
//!
//! Defines the fight entities exchanged between the two peers.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `Address`, `Side`
//! - **Simulation**: `Vec2`, `SpriteKind`, `PlayerStateSnapshot`
//! - **Input**: `InputKey`, `InputFrame`

use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address (last 20 bytes of keccak256(pubkey)).
///
/// This is the stable public identity of a signer.
pub type Address = [u8; 20];

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Maximum fighter health.
pub const MAX_HEALTH: u8 = 100;

/// Which of the two fighters a peer controls.
///
/// The side that accepts the inbound connection is `Primary` (player 1,
/// left of the arena); the initiating side is `Secondary` (player 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player 1.
    Primary,
    /// Player 2.
    Secondary,
}

impl Side {
    /// The other fighter.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Side::Primary => "primary",
            Side::Secondary => "secondary",
        }
    }
}

// =============================================================================
// CLUSTER B: SIMULATION
// =============================================================================

/// A 2D vector in arena pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Animation sprite currently shown by a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpriteKind {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    Attack,
    TakeHit,
    Death,
}

impl SpriteKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SpriteKind::Idle => "idle",
            SpriteKind::Run => "run",
            SpriteKind::Jump => "jump",
            SpriteKind::Fall => "fall",
            SpriteKind::Attack => "attack",
            SpriteKind::TakeHit => "takeHit",
            SpriteKind::Death => "death",
        }
    }
}

/// A complete description of one fighter's simulation-relevant state at an
/// instant.
///
/// Captured by value each tick and never mutated after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Health in `0..=100`.
    pub health: u8,
    pub facing_left: bool,
    pub is_attacking: bool,
    pub current_sprite: SpriteKind,
    pub dead: bool,
    /// Milliseconds since the Unix epoch at capture time.
    pub timestamp: u64,
}

// =============================================================================
// CLUSTER C: INPUT
// =============================================================================

/// A logical control key, independent of the physical binding
/// (`a`/`ArrowLeft`, `d`/`ArrowRight`, `w`/`ArrowUp`, space/`ArrowDown`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKey {
    Left,
    Right,
    Jump,
    Attack,
}

/// The set of keys held by a player during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    pub keys: Vec<InputKey>,
    pub timestamp: u64,
}

impl InputFrame {
    #[must_use]
    pub fn is_pressed(&self, key: InputKey) -> bool {
        self.keys.contains(&key)
    }
}

/// First eight hex characters of a hash or address, for log lines.
#[must_use]
pub fn short_hex(bytes: &[u8]) -> String {
    let len = bytes.len().min(4);
    hex::encode(&bytes[..len])
}
