//! Session state machine.
//!
//! ```text
//! Disconnected ─connect─► Connecting ─open / RoleAssignment─► Connected(role)
//!                                                                   │
//!       ┌──────────────────────── restart ───────────────────┐      ▼
//!       │                                                    Synchronizing(countdown)
//!       ▼                                                           │ countdown elapsed
//! Synchronizing ◄─ restart ─ Ended(outcome) ◄─ timer / death ─ Active
//! ```
//!
//! Transport close returns any phase to `Disconnected`.

use cf_02_state_sync::MatchOutcome;
use serde::{Deserialize, Serialize};
use shared_types::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Disconnected,
    /// Waiting for the channel (and, when initiating, for the role).
    Connecting { accepting: bool },
    Connected { role: Side },
    /// Pre-fight countdown; the fight starts at `fight_at` (ms).
    Synchronizing { role: Side, fight_at: u64 },
    Active { role: Side },
    Ended { role: Side, outcome: MatchOutcome },
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Disconnected => "disconnected",
            SessionPhase::Connecting { .. } => "connecting",
            SessionPhase::Connected { .. } => "connected",
            SessionPhase::Synchronizing { .. } => "synchronizing",
            SessionPhase::Active { .. } => "active",
            SessionPhase::Ended { .. } => "ended",
        }
    }

    /// Role held in this phase, once assigned.
    pub fn role(&self) -> Option<Side> {
        match *self {
            SessionPhase::Connected { role }
            | SessionPhase::Synchronizing { role, .. }
            | SessionPhase::Active { role }
            | SessionPhase::Ended { role, .. } => Some(role),
            SessionPhase::Disconnected | SessionPhase::Connecting { .. } => None,
        }
    }

    /// Remote records are validated and stored in these phases.
    pub fn admits_records(&self) -> bool {
        matches!(
            self,
            SessionPhase::Synchronizing { .. } | SessionPhase::Active { .. } | SessionPhase::Ended { .. }
        )
    }

    /// A new round may be started from these phases.
    pub fn can_restart(&self) -> bool {
        self.admits_records()
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        match *self {
            SessionPhase::Ended { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}
