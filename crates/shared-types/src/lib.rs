//! # Shared Types Crate
//!
//! This crate contains the fight data model and the peer wire payloads used by
//! every subsystem of the session core.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Value Types Only**: Snapshots and records are plain data. Nothing
//!   received from the remote peer carries behaviour; it is parsed by
//!   [`wire::decode`] into these types and validated structurally.
//! - **Exhaustive Payloads**: Every message on the channel is one variant of
//!   [`PeerMessage`].

pub mod entities;
pub mod errors;
pub mod record;
pub mod wire;

pub use entities::*;
pub use errors::*;
pub use record::{EcdsaSignature, SignedRecord};
pub use wire::PeerMessage;
