use serde::Serialize;

use crate::state::state_machine::RoundPhase;

/// Round phase exposed to the renderer and the health endpoint.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleRoundPhase {
    /// Welcome screen.
    Welcome,
    /// Voting screen.
    Voting,
    /// Shuffling overlay.
    Swapping,
    /// Result reveal.
    Revealing,
    /// Game-over screen.
    GameOver,
    /// Winners showcase.
    Winners,
}

impl From<RoundPhase> for VisibleRoundPhase {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Welcome => VisibleRoundPhase::Welcome,
            RoundPhase::Voting => VisibleRoundPhase::Voting,
            RoundPhase::Swapping => VisibleRoundPhase::Swapping,
            RoundPhase::Revealing => VisibleRoundPhase::Revealing,
            RoundPhase::GameOver => VisibleRoundPhase::GameOver,
            RoundPhase::Winners => VisibleRoundPhase::Winners,
        }
    }
}
