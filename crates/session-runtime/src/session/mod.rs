//! # Peer Session
//!
//! One [`Session`] per match. It owns everything the match needs (chain
//! state, sync engine, recorder, heartbeat, both fighters, role and phase)
//! and performs no I/O: callers feed it the clock, transport events and
//! signer results, then drain the messages and events it queued.
//!
//! ## Per-Tick Flow
//!
//! ```text
//! emit_tick ─► capture ─► (trust) prepare ─► SignTicket ─► signer
//!                                                             │
//! complete_signing ◄──────────────────────────────────────────┘
//!        │ finalize, record locally, queue SignedState
//!        └─► parked snapshot? sign it next
//!
//! handle_frame ─► decode ─► validate_and_store ─► apply to opponent ─► record
//! ```

mod events;
mod phase;
mod signing;

pub use events::SessionEvent;
pub use phase::SessionPhase;
pub use signing::{SignTicket, SigningSlot};

use std::sync::Arc;

use cf_01_chain_validation::{
    genesis_hash, ChainExport, ChainValidationApi, ChainValidator, RecordSigner, SignerError,
};
use cf_02_state_sync::{FighterState, MatchOutcome, StateSyncEngine};
use cf_03_replay::{HistoryEntry, ReplayPlayer, ReplayRecorder};
use cf_04_connection_health::{ConnectionHealthMonitor, ConnectionStatus, HealthEvent};
use fighter_telemetry::{
    log_record_event, metric_inc, metric_observe, CHAIN_FLAGS, CONNECTION_UNSTABLE, HEALTH_LATENCY, PEER_MESSAGES,
    RECORDS_REJECTED, RECORDS_SIGNED, SIGNER_FAILURES, SNAPSHOTS_EMITTED, SNAPSHOTS_SUPERSEDED,
    WIRE_ERRORS,
};
use serde::Serialize;
use shared_types::{
    short_hex, wire, Address, EcdsaSignature, Hash, PeerMessage, PlayerStateSnapshot, Side,
    SignedRecord, WireError,
};
use tracing::{debug, info, warn};

use crate::config::{SessionConfig, SyncMode};
use crate::errors::SessionError;

/// First round of a fresh session.
pub const FIRST_ROUND: u32 = 1;

/// Everything a finished (or abandoned) session leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub round: u32,
    pub role: Option<Side>,
    pub phase: SessionPhase,
    pub outcome: Option<MatchOutcome>,
    pub chain: ChainExport<PlayerStateSnapshot>,
    pub history: Vec<HistoryEntry>,
}

pub struct Session {
    config: SessionConfig,
    signer: Arc<dyn RecordSigner>,
    phase: SessionPhase,
    round: u32,
    role: Option<Side>,
    channel_open: bool,
    chain: ChainValidator<PlayerStateSnapshot>,
    sync: StateSyncEngine,
    recorder: ReplayRecorder,
    health: ConnectionHealthMonitor,
    local: FighterState,
    opponent: FighterState,
    slot: SigningSlot,
    /// Result of the last finished match; survives the channel closing.
    outcome: Option<MatchOutcome>,
    /// Received raw snapshots this round; raw mode has no record sequence.
    raw_received: u64,
    last_countdown: Option<u64>,
    outbox: Vec<PeerMessage>,
    events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(config: SessionConfig, signer: Arc<dyn RecordSigner>) -> Result<Self, SessionError> {
        config.validate()?;

        let genesis = genesis_hash(&config.session_id, FIRST_ROUND);
        let chain = ChainValidator::new(signer.identity(), genesis);
        info!(
            subsystem = "session",
            session_id = %config.session_id,
            identity = %short_hex(&signer.identity()),
            genesis = %short_hex(&genesis),
            mode = config.sync_mode.label(),
            "Session created"
        );

        Ok(Self {
            sync: StateSyncEngine::new(config.sync.clone()),
            health: ConnectionHealthMonitor::new(config.heartbeat.clone()),
            config,
            signer,
            phase: SessionPhase::Disconnected,
            round: FIRST_ROUND,
            role: None,
            channel_open: false,
            chain,
            recorder: ReplayRecorder::new(),
            local: FighterState::new(Side::Primary),
            opponent: FighterState::new(Side::Secondary),
            slot: SigningSlot::default(),
            outcome: None,
            raw_received: 0,
            last_countdown: None,
            outbox: Vec::new(),
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Result of the last finished match of this round, if any.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn role(&self) -> Option<Side> {
        self.role
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn identity(&self) -> Address {
        self.chain.local_identity()
    }

    pub fn genesis(&self) -> Hash {
        self.chain.genesis()
    }

    pub fn signer(&self) -> Arc<dyn RecordSigner> {
        Arc::clone(&self.signer)
    }

    pub fn chain(&self) -> &ChainValidator<PlayerStateSnapshot> {
        &self.chain
    }

    pub fn sync(&self) -> &StateSyncEngine {
        &self.sync
    }

    pub fn recorder(&self) -> &ReplayRecorder {
        &self.recorder
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.health.status()
    }

    pub fn latency(&self) -> Option<u64> {
        self.health.latency()
    }

    pub fn local_fighter(&self) -> &FighterState {
        &self.local
    }

    /// The fighter the local simulation drives.
    pub fn local_fighter_mut(&mut self) -> &mut FighterState {
        &mut self.local
    }

    pub fn opponent_fighter(&self) -> &FighterState {
        &self.opponent
    }

    pub fn is_signing(&self) -> bool {
        self.slot.is_busy()
    }

    /// Messages queued for the peer since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<PeerMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Events raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // PHASE TRANSITIONS
    // =========================================================================

    /// Start connecting. The accepting side will take `Primary`.
    pub fn connect(&mut self, accepting: bool) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Disconnected {
            return Err(self.invalid("connect"));
        }
        self.channel_open = false;
        self.enter(SessionPhase::Connecting { accepting });
        Ok(())
    }

    pub fn on_transport_open(&mut self, now: u64) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Connecting { accepting: true } => {
                self.channel_open = true;
                self.send(PeerMessage::RoleAssignment {
                    role: Side::Secondary,
                });
                self.assign_role(Side::Primary, now);
                Ok(())
            }
            SessionPhase::Connecting { accepting: false } => {
                self.channel_open = true;
                debug!(subsystem = "session", "Channel open, awaiting role");
                Ok(())
            }
            _ => Err(self.invalid("open the transport")),
        }
    }

    /// The channel is gone. Admitted records are kept.
    pub fn on_transport_close(&mut self) {
        if self.phase == SessionPhase::Disconnected {
            return;
        }
        self.channel_open = false;
        self.health.reset();
        CONNECTION_UNSTABLE.set(0.0);
        if let Some(unsigned) = self.slot.clear() {
            self.chain.abandon(&unsigned);
        }
        self.enter(SessionPhase::Disconnected);
        self.events.push(SessionEvent::Disconnected);
    }

    pub fn on_transport_error(&mut self, reason: String) {
        warn!(subsystem = "session", reason = %reason, "Transport error");
        self.events.push(SessionEvent::TransportError { reason });
    }

    /// Begin a new round with the same peer and role.
    ///
    /// The round counter salts a fresh genesis, so records of the previous
    /// round no longer verify. Both peers must restart to keep exchanging.
    pub fn restart(&mut self, now: u64) -> Result<(), SessionError> {
        let role = match self.phase.role() {
            Some(role) if self.phase.can_restart() => role,
            _ => return Err(self.invalid("restart")),
        };

        self.round += 1;
        let genesis = genesis_hash(&self.config.session_id, self.round);
        self.chain = ChainValidator::new(self.signer.identity(), genesis);
        self.slot.clear();
        self.sync = StateSyncEngine::new(self.config.sync.clone());
        self.recorder.clear();
        self.outcome = None;
        self.raw_received = 0;

        info!(
            subsystem = "session",
            round = self.round,
            genesis = %short_hex(&genesis),
            "Session restarted"
        );
        self.events.push(SessionEvent::Restarted { round: self.round });
        self.begin_countdown(role, now);
        Ok(())
    }

    fn assign_role(&mut self, role: Side, now: u64) {
        self.role = Some(role);
        self.enter(SessionPhase::Connected { role });
        self.events.push(SessionEvent::RoleAssigned { role });
        self.health.start(now);
        self.begin_countdown(role, now);
    }

    fn begin_countdown(&mut self, role: Side, now: u64) {
        let fight_at = now.saturating_add(self.config.sync.countdown_secs.saturating_mul(1000));
        self.last_countdown = None;
        self.enter(SessionPhase::Synchronizing { role, fight_at });
    }

    fn start_fight(&mut self, role: Side, now: u64) {
        self.sync
            .init_game(role, now, &mut self.local, &mut self.opponent);
        self.last_countdown = None;
        self.outcome = None;
        self.enter(SessionPhase::Active { role });
        self.events.push(SessionEvent::Fight);
    }

    fn enter(&mut self, next: SessionPhase) {
        debug!(
            subsystem = "session",
            from = self.phase.label(),
            to = next.label(),
            "Phase change"
        );
        self.phase = next;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.phase.label(),
            action,
        }
    }

    // =========================================================================
    // CLOCK
    // =========================================================================

    /// Advance countdown, match clock and heartbeat.
    pub fn tick(&mut self, now: u64) {
        match self.phase {
            SessionPhase::Synchronizing { role, fight_at } => {
                if now >= fight_at {
                    self.start_fight(role, now);
                } else {
                    let remaining_secs = (fight_at - now).div_ceil(1000);
                    if self.last_countdown != Some(remaining_secs) {
                        self.last_countdown = Some(remaining_secs);
                        self.events.push(SessionEvent::Countdown { remaining_secs });
                    }
                }
            }
            SessionPhase::Active { role } => {
                match self.sync.match_outcome(now, &self.local, &self.opponent) {
                    Ok(Some(outcome)) => {
                        info!(
                            subsystem = "session",
                            result = outcome.announcement(),
                            "Match ended"
                        );
                        self.outcome = Some(outcome);
                        self.enter(SessionPhase::Ended { role, outcome });
                        self.events.push(SessionEvent::MatchEnded { outcome });
                    }
                    Ok(None) => {}
                    Err(e) => warn!(subsystem = "session", error = %e, "Match clock unavailable"),
                }
            }
            _ => {}
        }

        if self.channel_open {
            self.poll_health(now);
        }
    }

    fn poll_health(&mut self, now: u64) {
        for event in self.health.poll(now) {
            match event {
                HealthEvent::SendPing(ping) => self.send(ping),
                HealthEvent::BecameUnstable { waited_ms } => {
                    CONNECTION_UNSTABLE.set(1.0);
                    self.events.push(SessionEvent::ConnectionUnstable { waited_ms });
                }
            }
        }
    }

    // =========================================================================
    // OUTBOUND STATE
    // =========================================================================

    /// Emit the local snapshot if a tick is due.
    ///
    /// Emission continues after the match ends so the peer receives the final
    /// state. In trust-minimized mode the returned ticket must be signed by
    /// the session's signer and handed back through
    /// [`Session::complete_signing`].
    pub fn emit_tick(&mut self, now: u64) -> Option<SignTicket> {
        let role = match self.phase {
            SessionPhase::Active { role } | SessionPhase::Ended { role, .. } => role,
            _ => return None,
        };
        if !self.sync.should_emit(now) {
            return None;
        }
        let snapshot = self.sync.capture_local_snapshot(&self.local, now);

        match self.config.sync_mode {
            SyncMode::Raw => {
                self.recorder
                    .record(snapshot.clone(), role, self.sync.emitted(), now);
                metric_inc!(SNAPSHOTS_EMITTED);
                self.send(PeerMessage::RawState { snapshot });
                None
            }
            SyncMode::TrustMinimized if self.slot.is_busy() => {
                if self.slot.supersede(snapshot) {
                    metric_inc!(SNAPSHOTS_SUPERSEDED);
                    debug!(subsystem = "session", "Superseded waiting snapshot");
                }
                None
            }
            SyncMode::TrustMinimized => self.begin_signing(snapshot),
        }
    }

    fn begin_signing(&mut self, snapshot: PlayerStateSnapshot) -> Option<SignTicket> {
        let timestamp = snapshot.timestamp;
        match self.chain.prepare(snapshot, timestamp) {
            Ok(unsigned) => Some(self.slot.begin(self.round, unsigned)),
            Err(e) => {
                warn!(subsystem = "session", error = %e, "Could not prepare record");
                self.events
                    .push(SessionEvent::SignerFailed { reason: e.to_string() });
                None
            }
        }
    }

    /// Hand back the signer's answer for `ticket`.
    ///
    /// Returns the next ticket when a parked snapshot is waiting. Answers for
    /// tickets of an earlier round or an abandoned request are dropped.
    pub fn complete_signing(
        &mut self,
        ticket: SignTicket,
        result: Result<EcdsaSignature, SignerError>,
    ) -> Option<SignTicket> {
        let Some(unsigned) = self.slot.take_matching(&ticket) else {
            debug!(
                subsystem = "session",
                sequence = ticket.sequence,
                round = ticket.round,
                "Dropped stale signature"
            );
            return None;
        };

        match result {
            Ok(signature) => match self.chain.finalize(unsigned, signature) {
                Ok(record) => self.publish(record),
                Err(e) => self.signing_failed(e.to_string()),
            },
            Err(e) => {
                self.chain.abandon(&unsigned);
                self.signing_failed(e.to_string());
            }
        }

        let next = self.slot.take_waiting()?;
        self.begin_signing(next)
    }

    fn publish(&mut self, record: SignedRecord<PlayerStateSnapshot>) {
        if let Some(role) = self.role {
            self.recorder.record(
                record.payload.clone(),
                role,
                record.sequence,
                record.timestamp,
            );
        }
        metric_inc!(RECORDS_SIGNED);
        metric_inc!(SNAPSHOTS_EMITTED);
        log_record_event!(
            debug,
            "session",
            "Publishing signed state",
            record.sequence,
            short_hex(&record.hash)
        );
        self.events.push(SessionEvent::RecordSigned {
            sequence: record.sequence,
            hash: record.hash,
        });
        self.send(PeerMessage::SignedState { record });
    }

    fn signing_failed(&mut self, reason: String) {
        metric_inc!(SIGNER_FAILURES);
        warn!(subsystem = "session", reason = %reason, "Signing failed, tick skipped");
        self.events.push(SessionEvent::SignerFailed { reason });
    }

    fn send(&mut self, message: PeerMessage) {
        self.outbox.push(message);
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Decode and handle one frame from the peer. Never fails: problems
    /// become events.
    pub fn handle_frame(&mut self, frame: &[u8], now: u64) {
        let message = match wire::decode(frame) {
            Ok(message) => message,
            Err(e) => {
                metric_inc!(WIRE_ERRORS, &[wire_error_kind(&e)]);
                warn!(subsystem = "session", error = %e, bytes = frame.len(), "Dropped frame");
                self.events
                    .push(SessionEvent::MalformedFrame { reason: e.to_string() });
                return;
            }
        };

        metric_inc!(PEER_MESSAGES, &["received", message.kind()]);
        if let Err(e) = self.handle_message(message, now) {
            warn!(subsystem = "session", error = %e, "Rejected peer message");
            self.events
                .push(SessionEvent::ProtocolViolation { reason: e.to_string() });
        }
    }

    /// Handle one decoded message.
    pub fn handle_message(&mut self, message: PeerMessage, now: u64) -> Result<(), SessionError> {
        match message {
            PeerMessage::RoleAssignment { role } => self.on_role_assignment(role, now),
            PeerMessage::SignedState { record } => self.on_signed_state(record),
            PeerMessage::RawState { snapshot } => self.on_raw_state(snapshot),
            PeerMessage::Ping { time } => {
                let pong = self.health.on_ping(time);
                self.send(pong);
                Ok(())
            }
            PeerMessage::Pong { time } => {
                self.on_pong(time, now);
                Ok(())
            }
        }
    }

    fn on_role_assignment(&mut self, role: Side, now: u64) -> Result<(), SessionError> {
        if self.phase != (SessionPhase::Connecting { accepting: false }) {
            return Err(self.invalid("accept a role assignment"));
        }
        self.channel_open = true;
        self.assign_role(role, now);
        Ok(())
    }

    fn on_signed_state(&mut self, record: SignedRecord<PlayerStateSnapshot>) -> Result<(), SessionError> {
        if self.config.sync_mode != SyncMode::TrustMinimized {
            return Err(SessionError::ModeMismatch {
                mode: self.config.sync_mode.label(),
                received: "signed_state",
            });
        }
        if !self.phase.admits_records() {
            return Err(self.invalid("accept a signed state"));
        }

        let result = self.chain.validate_and_store(record);
        if let Some(rejection) = result.rejection {
            metric_inc!(RECORDS_REJECTED, &[rejection.label()]);
            self.events.push(SessionEvent::TrustWarning { rejection });
            return Ok(());
        }
        for flag in result.flags {
            metric_inc!(CHAIN_FLAGS, &[flag.label()]);
            self.events.push(SessionEvent::ChainFlagged { flag });
        }
        if let Some(record) = result.record {
            self.apply_remote(&record.payload, record.sequence, record.timestamp);
        }
        Ok(())
    }

    fn on_raw_state(&mut self, snapshot: PlayerStateSnapshot) -> Result<(), SessionError> {
        if self.config.sync_mode != SyncMode::Raw {
            return Err(SessionError::ModeMismatch {
                mode: self.config.sync_mode.label(),
                received: "raw_state",
            });
        }
        if !self.phase.admits_records() {
            return Err(self.invalid("accept a raw state"));
        }
        self.raw_received += 1;
        let timestamp = snapshot.timestamp;
        self.apply_remote(&snapshot, self.raw_received, timestamp);
        Ok(())
    }

    /// Reconcile into the opponent and record, while the fight is live.
    fn apply_remote(&mut self, snapshot: &PlayerStateSnapshot, sequence: u64, timestamp: u64) {
        let SessionPhase::Active { role } = self.phase else {
            debug!(
                subsystem = "session",
                phase = self.phase.label(),
                sequence,
                "Stored without applying"
            );
            return;
        };
        let report = self.sync.apply_remote_snapshot(snapshot, &mut self.opponent);
        if report.died {
            info!(subsystem = "session", "Opponent defeated");
        }
        self.recorder
            .record(snapshot.clone(), role.opposite(), sequence, timestamp);
    }

    fn on_pong(&mut self, echoed: u64, now: u64) {
        let Some(outcome) = self.health.on_pong(echoed, now) else {
            return;
        };
        metric_observe!(HEALTH_LATENCY, outcome.latency_ms as f64);
        self.events.push(SessionEvent::LatencyMeasured {
            latency_ms: outcome.latency_ms,
        });
        if outcome.recovered {
            CONNECTION_UNSTABLE.set(0.0);
            self.events.push(SessionEvent::ConnectionRecovered {
                latency_ms: outcome.latency_ms,
            });
        }
    }

    // =========================================================================
    // EXPORT
    // =========================================================================

    /// Player over this round's recorded history.
    pub fn replay(&self) -> Result<ReplayPlayer, SessionError> {
        Ok(ReplayPlayer::new(
            self.recorder.export(),
            self.config.replay.clone(),
        )?)
    }

    pub fn history_json(&self) -> Result<String, SessionError> {
        Ok(self.recorder.to_json()?)
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.config.session_id.clone(),
            round: self.round,
            role: self.role,
            phase: self.phase,
            outcome: self.outcome,
            chain: self.chain.export_chain(),
            history: self.recorder.export(),
        }
    }
}

fn wire_error_kind(error: &WireError) -> &'static str {
    match error {
        WireError::Encode(_) => "encode",
        WireError::Decode(_) => "decode",
        WireError::UnsupportedVersion { .. } => "version",
        WireError::Malformed(_) => "malformed",
    }
}
