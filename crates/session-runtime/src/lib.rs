//! # Session Runtime Library
//!
//! One peer of a Crypto Fighter match. The `main.rs` binary wires two peers
//! together in-process; embedders link this library and supply their own
//! transport and signer adapters.
//!
//! ## Architectural Patterns
//!
//! - **Sans-IO core**: [`Session`] owns the per-match state and performs no I/O
//! - **Single event loop**: [`SessionDriver`] selects over transport, timers
//!   and the outstanding signature; the session is never shared
//! - **Hexagonal Architecture**: the transport ([`TransportChannel`]) and the
//!   signer (`RecordSigner`) are ports with in-process adapters

#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_lines)]

pub mod config;
pub mod driver;
pub mod errors;
pub mod session;
pub mod transport;

pub use config::{ConfigError, SessionConfig, SyncMode};
pub use driver::{FrameHook, SessionClock, SessionCommand, SessionDriver, SessionHandle};
pub use errors::SessionError;
pub use session::{Session, SessionEvent, SessionPhase, SessionReport, SignTicket, FIRST_ROUND};
pub use transport::{MemoryTransport, TransportChannel, TransportEvent, TransportEvents};
