//! Single-slot signing pipeline.
//!
//! At most one record is in flight with the signer. A snapshot that comes due
//! meanwhile parks in the waiting slot, replacing whatever was parked there
//! before. When the signature lands, the parked snapshot is signed next.

use cf_01_chain_validation::UnsignedRecord;
use shared_types::{Hash, PlayerStateSnapshot};

/// Identifies one signing request across the await point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignTicket {
    pub round: u32,
    pub sequence: u64,
    /// What the signer must sign.
    pub digest: Hash,
}

#[derive(Debug, Default)]
pub struct SigningSlot {
    in_flight: Option<(SignTicket, UnsignedRecord<PlayerStateSnapshot>)>,
    waiting: Option<PlayerStateSnapshot>,
}

impl SigningSlot {
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn waiting(&self) -> Option<&PlayerStateSnapshot> {
        self.waiting.as_ref()
    }

    /// Park a snapshot. Returns true if an older parked snapshot was dropped.
    pub fn supersede(&mut self, snapshot: PlayerStateSnapshot) -> bool {
        self.waiting.replace(snapshot).is_some()
    }

    /// Put a prepared record in flight.
    pub fn begin(&mut self, round: u32, unsigned: UnsignedRecord<PlayerStateSnapshot>) -> SignTicket {
        let ticket = SignTicket {
            round,
            sequence: unsigned.sequence(),
            digest: unsigned.digest,
        };
        self.in_flight = Some((ticket, unsigned));
        ticket
    }

    /// Take the in-flight record if `ticket` is the one it was issued for.
    pub fn take_matching(&mut self, ticket: &SignTicket) -> Option<UnsignedRecord<PlayerStateSnapshot>> {
        match &self.in_flight {
            Some((current, _)) if current == ticket => self.in_flight.take().map(|(_, u)| u),
            _ => None,
        }
    }

    pub fn take_waiting(&mut self) -> Option<PlayerStateSnapshot> {
        self.waiting.take()
    }

    /// Empty both slots, handing back the in-flight record to release.
    pub fn clear(&mut self) -> Option<UnsignedRecord<PlayerStateSnapshot>> {
        self.waiting = None;
        self.in_flight.take().map(|(_, u)| u)
    }
}
