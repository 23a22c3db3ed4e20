//! # Transport Port
//!
//! The session speaks to its peer through a single ordered, reliable channel.
//! Outbound bytes go through [`TransportChannel::send`]; everything the
//! channel observes arrives as a [`TransportEvent`] pushed into an mpsc queue
//! the driver selects on.
//!
//! Connection establishment and NAT traversal belong to the adapter.

mod memory;

pub use memory::MemoryTransport;

use async_trait::async_trait;
use shared_types::TransportError;
use tokio::sync::mpsc;

/// Something the channel observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The channel is usable.
    Open,
    /// One complete frame from the peer.
    Data(Vec<u8>),
    /// The channel reported a failure; it may still be open.
    Error(String),
    /// The channel is gone.
    Close,
}

/// Inbound side of a channel.
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// Outbound side of a channel.
#[async_trait]
pub trait TransportChannel: Send + Sync {
    /// Send one frame.
    ///
    /// # Errors
    /// * `TransportError::Closed` - the channel is not open
    /// * `TransportError::Failed` - the adapter could not deliver
    async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Close the channel. Both ends observe `TransportEvent::Close`.
    fn close(&self);

    fn is_open(&self) -> bool;
}
