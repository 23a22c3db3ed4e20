//! # Replay Subsystem (CF-03)
//!
//! Records both fighters during a match and plays the history back through
//! the live reconciliation path.
//!
//! - [`ReplayRecorder`]: append-only per-side logs, merge, JSON export
//! - [`ReplayPlayer`]: paced playback with pause, resume and speed control

pub mod config;
pub mod domain;
pub mod player;
pub mod recorder;

pub use config::ReplayConfig;
pub use domain::{merge_histories, HistoryEntry, PlaybackControl, ReplayError};
pub use player::{ReplayHandle, ReplayPlayer, ReplayReport};
pub use recorder::{history_from_json, ReplayRecorder};
