//! # Replay Recorder
//!
//! Append-only history of both fighters for one match round.

use shared_types::{PlayerStateSnapshot, Side};
use tracing::debug;

use crate::domain::{merge_histories, HistoryEntry, ReplayError};

/// Per-side append-only snapshot logs.
#[derive(Debug, Clone, Default)]
pub struct ReplayRecorder {
    primary: Vec<HistoryEntry>,
    secondary: Vec<HistoryEntry>,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot of `side`'s fighter.
    pub fn record(&mut self, snapshot: PlayerStateSnapshot, side: Side, sequence: u64, timestamp: u64) {
        let entry = HistoryEntry {
            snapshot,
            timestamp,
            sequence,
            side,
        };
        match side {
            Side::Primary => self.primary.push(entry),
            Side::Secondary => self.secondary.push(entry),
        }
    }

    /// Entries recorded for one side, in recording order.
    pub fn history(&self, side: Side) -> &[HistoryEntry] {
        match side {
            Side::Primary => &self.primary,
            Side::Secondary => &self.secondary,
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Both sides merged by `(timestamp, sequence)`.
    pub fn merge(&self) -> Vec<HistoryEntry> {
        merge_histories(&self.primary, &self.secondary)
    }

    /// Flat, ordered history for external tools.
    pub fn export(&self) -> Vec<HistoryEntry> {
        let merged = self.merge();
        debug!(subsystem = "cf-03", entries = merged.len(), "Exported history");
        merged
    }

    /// [`export`](Self::export) as a JSON array.
    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(&self.export())?)
    }

    /// Drop everything recorded (new round).
    pub fn clear(&mut self) {
        self.primary.clear();
        self.secondary.clear();
    }
}

/// Parse a history previously written by [`ReplayRecorder::to_json`].
pub fn history_from_json(json: &str) -> Result<Vec<HistoryEntry>, ReplayError> {
    Ok(serde_json::from_str(json)?)
}
