//! # State Synchronization Subsystem (CF-02)
//!
//! Keeps the two fighters visually synchronized: the local fighter is
//! sampled at a fixed tick rate and received snapshots are reconciled into
//! the opponent under monotonic health rules.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): fighter rules, match outcome
//! - **Ports** (`ports.rs`): the [`Fighter`] entity contract
//! - **Service Layer** (`service.rs`): [`StateSyncEngine`]

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{SyncConfig, MAX_COUNTDOWN_SECONDS, MAX_MATCH_SECONDS};
pub use domain::{canonical_start, FighterState, MatchOutcome, SyncError, HIT_DAMAGE};
pub use ports::Fighter;
pub use service::{ApplyReport, StateSyncEngine};
