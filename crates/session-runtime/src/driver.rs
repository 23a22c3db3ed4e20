//! # Session Driver
//!
//! Runs one [`Session`] on a single task. Every activity is a branch of one
//! `tokio::select!` loop, so the session is only ever touched from here and
//! needs no locks:
//!
//! - inbound transport events (pushed by the adapter through an mpsc queue)
//! - commands from [`SessionHandle`]s (restart, close)
//! - the frame tick (local simulation callback, countdown, match clock, heartbeat)
//! - the emit tick (snapshot capture and, in trust mode, a signing request)
//! - the outstanding signature, if any
//!
//! After each branch the session's outbox is encoded and sent, and its events
//! are forwarded to the subscriber.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cf_01_chain_validation::SignerError;
use cf_02_state_sync::FighterState;
use fighter_telemetry::{log_event, metric_inc, PEER_MESSAGES, WIRE_ERRORS};
use futures::future::OptionFuture;
use shared_types::{wire, EcdsaSignature};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::errors::SessionError;
use crate::session::{Session, SessionEvent, SessionPhase, SessionReport, SignTicket};
use crate::transport::{TransportChannel, TransportEvent, TransportEvents};

/// Local simulation callback, run on every frame tick while the fight is live.
pub type FrameHook = Box<dyn FnMut(&mut FighterState, u64) + Send>;

type SignFuture =
    Pin<Box<dyn Future<Output = (SignTicket, Result<EcdsaSignature, SignerError>)> + Send>>;

/// Control messages for a running driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Restart,
    Close,
}

/// Cheap, cloneable remote control for a [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Returns false once the driver has stopped.
    pub fn restart(&self) -> bool {
        self.commands.send(SessionCommand::Restart).is_ok()
    }

    /// Returns false once the driver has stopped.
    pub fn close(&self) -> bool {
        self.commands.send(SessionCommand::Close).is_ok()
    }
}

/// Wall-clock milliseconds derived from the tokio clock, so paused-time tests
/// see time advance.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
    base_ms: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        let base_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::starting_at(base_ms)
    }

    /// A clock reading `base_ms` now.
    pub fn starting_at(base_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            base_ms,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.base_ms + self.origin.elapsed().as_millis() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SessionDriver {
    session: Session,
    transport: Arc<dyn TransportChannel>,
    inbound: TransportEvents,
    accepting: bool,
    commands_tx: mpsc::UnboundedSender<SessionCommand>,
    commands_rx: mpsc::UnboundedReceiver<SessionCommand>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    frame_hook: Option<FrameHook>,
    clock: SessionClock,
}

impl SessionDriver {
    /// Drive `session` over `transport`. The accepting side takes `Primary`.
    pub fn new(
        session: Session,
        transport: Arc<dyn TransportChannel>,
        inbound: TransportEvents,
        accepting: bool,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            session,
            transport,
            inbound,
            accepting,
            commands_tx,
            commands_rx,
            events: None,
            frame_hook: None,
            clock: SessionClock::new(),
        }
    }

    pub fn with_frame_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut FighterState, u64) + Send + 'static,
    {
        self.frame_hook = Some(Box::new(hook));
        self
    }

    pub fn with_clock(mut self, clock: SessionClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            commands: self.commands_tx.clone(),
        }
    }

    /// Receive every event the session raises. A later call replaces the
    /// earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until the transport closes or a `Close` command arrives.
    pub async fn run(mut self) -> Result<SessionReport, SessionError> {
        self.session.connect(self.accepting)?;

        let config = self.session.config();
        let mut frame = interval(Duration::from_millis(config.frame_interval_ms()));
        let mut emit = interval(Duration::from_secs_f64(
            config.sync.emit_interval_ms() / 1000.0,
        ));
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
        emit.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log_event!(
            info,
            "session",
            "Session driver started",
            accepting = self.accepting,
            mode = self.session.config().sync_mode.label()
        );

        let mut signing: Option<SignFuture> = None;
        let mut running = true;

        while running {
            tokio::select! {
                event = self.inbound.recv() => {
                    let now = self.clock.now_ms();
                    match event {
                        Some(event) => running = self.on_transport_event(event, now),
                        None => {
                            self.session.on_transport_close();
                            running = false;
                        }
                    }
                }
                Some(command) = self.commands_rx.recv() => {
                    let now = self.clock.now_ms();
                    match command {
                        SessionCommand::Restart => {
                            signing = None;
                            if let Err(e) = self.session.restart(now) {
                                warn!(subsystem = "session", error = %e, "Restart refused");
                            }
                        }
                        SessionCommand::Close => {
                            self.transport.close();
                            self.session.on_transport_close();
                            running = false;
                        }
                    }
                }
                _ = frame.tick() => {
                    let now = self.clock.now_ms();
                    if let Some(hook) = self.frame_hook.as_mut() {
                        if matches!(self.session.phase(), SessionPhase::Active { .. }) {
                            hook(self.session.local_fighter_mut(), now);
                        }
                    }
                    self.session.tick(now);
                }
                _ = emit.tick() => {
                    let now = self.clock.now_ms();
                    if let Some(ticket) = self.session.emit_tick(now) {
                        signing = Some(self.sign(ticket));
                    }
                }
                Some((ticket, result)) = OptionFuture::from(signing.as_mut()) => {
                    signing = self
                        .session
                        .complete_signing(ticket, result)
                        .map(|next| self.sign(next));
                }
            }

            self.flush_outbox().await;
            self.forward_events();
        }

        log_event!(
            info,
            "session",
            "Session driver stopped",
            round = self.session.round(),
            phase = self.session.phase().label()
        );
        Ok(self.session.report())
    }

    /// Returns whether the loop keeps running.
    fn on_transport_event(&mut self, event: TransportEvent, now: u64) -> bool {
        match event {
            TransportEvent::Open => {
                if let Err(e) = self.session.on_transport_open(now) {
                    warn!(subsystem = "session", error = %e, "Unexpected open");
                }
                true
            }
            TransportEvent::Data(frame) => {
                self.session.handle_frame(&frame, now);
                true
            }
            TransportEvent::Error(reason) => {
                self.session.on_transport_error(reason);
                true
            }
            TransportEvent::Close => {
                self.session.on_transport_close();
                false
            }
        }
    }

    fn sign(&self, ticket: SignTicket) -> SignFuture {
        let signer = self.session.signer();
        debug!(subsystem = "session", sequence = ticket.sequence, "Requesting signature");
        Box::pin(async move {
            let result = signer.sign_digest(ticket.digest).await;
            (ticket, result)
        })
    }

    async fn flush_outbox(&mut self) {
        for message in self.session.drain_outbox() {
            let frame = match wire::encode(&message) {
                Ok(frame) => frame,
                Err(e) => {
                    metric_inc!(WIRE_ERRORS, &["encode"]);
                    warn!(subsystem = "session", error = %e, kind = message.kind(), "Dropped outbound message");
                    continue;
                }
            };
            match self.transport.send(frame).await {
                Ok(()) => metric_inc!(PEER_MESSAGES, &["sent", message.kind()]),
                Err(e) => self.session.on_transport_error(e.to_string()),
            }
        }
    }

    fn forward_events(&mut self) {
        let events = self.session.drain_events();
        let Some(tx) = self.events.as_ref() else {
            return;
        };
        let gone = events.into_iter().any(|event| tx.send(event).is_err());
        if gone {
            self.events = None;
        }
    }
}
