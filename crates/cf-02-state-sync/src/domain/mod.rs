//! # Domain Layer
//!
//! Fighter rules and match outcome. No clocks, no I/O.

pub mod errors;
pub mod fighter;
pub mod outcome;

pub use errors::SyncError;
pub use fighter::{canonical_start, FighterState, HIT_DAMAGE, PRIMARY_START, SECONDARY_START};
pub use outcome::MatchOutcome;
