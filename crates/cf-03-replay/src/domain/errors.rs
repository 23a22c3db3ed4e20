//! # Replay Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    /// History could not be written or read as JSON.
    #[error("History serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration value out of range.
    #[error("Invalid replay configuration: {0}")]
    InvalidConfig(String),

    /// Nothing to play back.
    #[error("History is empty")]
    EmptyHistory,
}
