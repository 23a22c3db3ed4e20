//! # Session Errors

use cf_01_chain_validation::ChainError;
use cf_03_replay::ReplayError;
use shared_types::{TransportError, WireError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by a session or its driver.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The requested action is not allowed in the current phase.
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    /// A state message for the other sync mode.
    #[error("Received {received} in {mode} mode")]
    ModeMismatch {
        mode: &'static str,
        received: &'static str,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}
