//! # Crypto Fighter Session Runtime
//!
//! Demo entry point: runs both peers of one match in-process over a
//! [`MemoryTransport`] pair, each with its own key.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry from `CF_*` environment variables
//! 2. Load and validate the session configuration
//! 3. Create one session per peer and spawn its driver
//! 4. Wait for the match to end, then close the channel
//! 5. Summarize both chains and replay the acceptor's history at 2x

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cf_01_chain_validation::LocalKeySigner;
use cf_02_state_sync::Fighter;
use fighter_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_types::short_hex;
use tokio::sync::mpsc;
use tracing::{info, warn};

use session_runtime::{
    MemoryTransport, Session, SessionConfig, SessionDriver, SessionEvent, SessionReport,
};

/// Spacing of scripted actions in the demo.
const ACTION_EVERY_MS: u64 = 700;

/// How long an attack animation stays up.
const ATTACK_MS: u64 = 100;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = SessionConfig::from_env();
    config.validate().context("Invalid session configuration")?;

    info!("===========================================");
    info!("  Crypto Fighter Session Runtime v0.1.0");
    info!("  Session: {}", config.session_id);
    info!("  Mode: {}", config.sync_mode.label());
    info!("===========================================");

    let ((acceptor_end, acceptor_rx), (initiator_end, initiator_rx)) = MemoryTransport::pair();

    let acceptor = Session::new(config.clone(), Arc::new(LocalKeySigner::random()))
        .context("Failed to create acceptor session")?;
    let initiator = Session::new(config.clone(), Arc::new(LocalKeySigner::random()))
        .context("Failed to create initiator session")?;

    // Player 1 swings, player 2 gets hit.
    let mut last_swing: Option<u64> = None;
    let mut acceptor = SessionDriver::new(acceptor, Arc::new(acceptor_end), acceptor_rx, true)
        .with_frame_hook(move |fighter, now| {
            let due = last_swing.map_or(true, |t| now.saturating_sub(t) >= ACTION_EVERY_MS);
            if due {
                fighter.attack();
                last_swing = Some(now);
            } else if last_swing.is_some_and(|t| now.saturating_sub(t) >= ATTACK_MS) {
                fighter.set_attacking(false);
            }
        });
    let mut next_hit: Option<u64> = None;
    let initiator = SessionDriver::new(initiator, Arc::new(initiator_end), initiator_rx, false)
        .with_frame_hook(move |fighter, now| {
            let due = *next_hit.get_or_insert(now + ACTION_EVERY_MS);
            if now >= due && !fighter.dead {
                fighter.take_hit();
                next_hit = Some(now + ACTION_EVERY_MS);
            }
        });

    let mut events = acceptor.subscribe();
    let handle = acceptor.handle();
    let acceptor_task = tokio::spawn(acceptor.run());
    let initiator_task = tokio::spawn(initiator.run());

    let deadline = Duration::from_secs(config.sync.countdown_secs + config.sync.match_duration_secs + 5);
    let ended = tokio::time::timeout(deadline, wait_for_end(&mut events)).await;
    if ended.is_err() {
        warn!("Match did not end before the deadline");
    }
    handle.close();

    let acceptor_report = acceptor_task
        .await
        .context("Acceptor task panicked")?
        .context("Acceptor session failed")?;
    let initiator_report = initiator_task
        .await
        .context("Initiator task panicked")?
        .context("Initiator session failed")?;

    summarize("acceptor", &acceptor_report);
    summarize("initiator", &initiator_report);
    if acceptor_report.chain.local_records.len() < initiator_report.chain.remote_records.len() {
        bail!("initiator admitted more records than the acceptor signed");
    }

    replay(&config, acceptor_report).await?;

    match encode_metrics() {
        Ok(text) => info!(bytes = text.len(), "Metrics snapshot encoded"),
        Err(e) => warn!(error = %e, "Metrics export failed"),
    }
    Ok(())
}

async fn wait_for_end(events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::MatchEnded { outcome } => {
                info!(result = outcome.announcement(), "Match over");
                return;
            }
            SessionEvent::TrustWarning { rejection } => warn!(%rejection, "Trust warning"),
            SessionEvent::Disconnected => return,
            _ => {}
        }
    }
}

fn summarize(peer: &str, report: &SessionReport) {
    let last = report
        .chain
        .local_records
        .last()
        .map(|r| short_hex(&r.hash))
        .unwrap_or_else(|| "-".into());
    info!(
        peer,
        role = report.role.map_or("none", |r| r.label()),
        genesis = %short_hex(&report.chain.genesis),
        signed = report.chain.local_records.len(),
        admitted = report.chain.remote_records.len(),
        head = %last,
        history = report.history.len(),
        "Session report"
    );
}

async fn replay(config: &SessionConfig, report: SessionReport) -> Result<()> {
    if report.history.is_empty() {
        info!("Nothing recorded, skipping replay");
        return Ok(());
    }
    let mut player = cf_03_replay::ReplayPlayer::new(report.history, config.replay.clone())
        .context("Failed to load history")?;
    let result = player.run(2.0).await;
    info!(
        applied = result.applied,
        primary_health = result.primary.health,
        secondary_health = result.secondary.health,
        "Replay finished"
    );
    Ok(())
}
