//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by the transport channel or the wire codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The channel is not open (never opened, or already closed).
    #[error("Transport channel is closed")]
    Closed,

    /// The underlying channel reported a failure.
    #[error("Transport failure: {0}")]
    Failed(String),
}

/// Errors raised while encoding or parsing a wire frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// Frame could not be encoded.
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    /// Frame bytes are not a valid encoding.
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// Wire version not supported.
    #[error("Unsupported wire version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u8, supported: u8 },

    /// Frame decoded but its content is structurally invalid.
    #[error("Malformed message: {0}")]
    Malformed(String),
}
