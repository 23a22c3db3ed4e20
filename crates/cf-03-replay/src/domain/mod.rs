//! # Domain Layer

pub mod entities;
pub mod errors;

pub use entities::{merge_histories, HistoryEntry, PlaybackControl};
pub use errors::ReplayError;
