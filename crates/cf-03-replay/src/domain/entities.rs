//! # History Entities

use serde::{Deserialize, Serialize};
use shared_types::{PlayerStateSnapshot, Side};

/// One recorded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub snapshot: PlayerStateSnapshot,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Per-side record sequence (0 in raw mode where no chain exists).
    pub sequence: u64,
    /// Fighter the snapshot describes.
    pub side: Side,
}

impl HistoryEntry {
    fn order_key(&self) -> (u64, u64) {
        (self.timestamp, self.sequence)
    }
}

/// Merge two histories into one ordered by `(timestamp, sequence)`.
///
/// The sort is stable: entries with equal keys keep `a` before `b` and their
/// original relative order. Nothing is dropped or duplicated.
#[must_use]
pub fn merge_histories(a: &[HistoryEntry], b: &[HistoryEntry]) -> Vec<HistoryEntry> {
    let mut merged: Vec<HistoryEntry> = a.iter().chain(b.iter()).cloned().collect();
    merged.sort_by_key(HistoryEntry::order_key);
    merged
}

/// Playback knobs shared between a player and its handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackControl {
    pub paused: bool,
    /// Multiplier on the recorded tick rate.
    pub speed: f64,
}

impl Default for PlaybackControl {
    fn default() -> Self {
        Self {
            paused: false,
            speed: 1.0,
        }
    }
}
