//! # Match Outcome

use serde::{Deserialize, Serialize};
use shared_types::Side;

/// Result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Winner(Side),
    Tie,
}

impl MatchOutcome {
    /// Equal health is a tie, otherwise the healthier fighter wins.
    #[must_use]
    pub fn decide(primary_health: u8, secondary_health: u8) -> Self {
        match primary_health.cmp(&secondary_health) {
            std::cmp::Ordering::Equal => MatchOutcome::Tie,
            std::cmp::Ordering::Greater => MatchOutcome::Winner(Side::Primary),
            std::cmp::Ordering::Less => MatchOutcome::Winner(Side::Secondary),
        }
    }

    /// Banner text shown when the match ends.
    #[must_use]
    pub fn announcement(self) -> &'static str {
        match self {
            MatchOutcome::Winner(Side::Primary) => "Player 1 Wins",
            MatchOutcome::Winner(Side::Secondary) => "Player 2 Wins",
            MatchOutcome::Tie => "Tie",
        }
    }
}
