//! # Sync Errors

use thiserror::Error;

/// Errors raised by the state synchronization subsystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Configuration value out of range.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// An operation needs `init_game` first.
    #[error("Game has not been initialized")]
    NotInitialized,
}
