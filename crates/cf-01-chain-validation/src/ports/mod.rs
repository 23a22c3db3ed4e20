//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API the session uses
//! - **Outbound (Driven)**: the signing capability this subsystem needs

pub mod inbound;
pub mod outbound;
