//! # Integration Flows
//!
//! - `chain_flows`: two peers exchanging records with no session around them
//! - `session_flows`: full matches between two drivers over a memory channel
//! - `replay_flows`: recording a match and playing it back

pub mod chain_flows;
pub mod replay_flows;
pub mod session_flows;
