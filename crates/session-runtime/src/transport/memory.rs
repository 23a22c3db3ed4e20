//! In-process transport pair backed by unbounded mpsc queues.
//!
//! Used by the integration tests and the demo binary. Delivery is ordered and
//! lossless unless an end is told to drop its outgoing frames, which simulates
//! a silent peer for heartbeat tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::TransportError;
use tokio::sync::mpsc;
use tracing::debug;

use super::{TransportChannel, TransportEvent, TransportEvents};

/// One end of an in-memory channel.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    name: &'static str,
    to_peer: mpsc::UnboundedSender<TransportEvent>,
    to_self: mpsc::UnboundedSender<TransportEvent>,
    open: Arc<AtomicBool>,
    dropping: Arc<AtomicBool>,
}

impl MemoryTransport {
    /// Two connected ends, `(acceptor, initiator)`. Both event queues already
    /// hold `TransportEvent::Open`.
    pub fn pair() -> ((MemoryTransport, TransportEvents), (MemoryTransport, TransportEvents)) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        let acceptor = MemoryTransport {
            name: "acceptor",
            to_peer: b_tx.clone(),
            to_self: a_tx.clone(),
            open: Arc::clone(&open),
            dropping: Arc::new(AtomicBool::new(false)),
        };
        let initiator = MemoryTransport {
            name: "initiator",
            to_peer: a_tx.clone(),
            to_self: b_tx.clone(),
            open,
            dropping: Arc::new(AtomicBool::new(false)),
        };

        let _ = a_tx.send(TransportEvent::Open);
        let _ = b_tx.send(TransportEvent::Open);

        ((acceptor, a_rx), (initiator, b_rx))
    }

    /// Silently discard frames sent from this end while `drop` is set.
    pub fn set_dropping(&self, drop: bool) {
        self.dropping.store(drop, Ordering::SeqCst);
    }

    /// Deliver a channel failure to this end's own event queue.
    pub fn report_error(&self, reason: impl Into<String>) {
        let _ = self.to_self.send(TransportEvent::Error(reason.into()));
    }
}

#[async_trait]
impl TransportChannel for MemoryTransport {
    async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        if self.dropping.load(Ordering::SeqCst) {
            debug!(subsystem = "session", end = self.name, bytes = frame.len(), "Dropped frame");
            return Ok(());
        }
        self.to_peer
            .send(TransportEvent::Data(frame))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.to_self.send(TransportEvent::Close);
            let _ = self.to_peer.send(TransportEvent::Close);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
