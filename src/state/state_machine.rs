use thiserror::Error;

/// Phases the display cycles through during a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// Welcome screen shown on start, on reconnection and after a game ends.
    Welcome,
    /// Audience votes are being collected for the current round.
    Voting,
    /// Voting closed; the cups are being shuffled before the result is requested.
    Swapping,
    /// The result was requested and is (or is about to be) revealed.
    Revealing,
    /// The session ended early without winners.
    GameOver,
    /// The session completed and the winners are showcased.
    Winners,
}

/// Events that move the phase graph forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// The server link came up (first connection or reconnection).
    Reconnected,
    /// The welcome countdown ran out.
    WelcomeElapsed,
    /// The voting countdown ran out.
    VotingClosed,
    /// The settle delay passed and `get_result` was sent.
    ResultRequested,
    /// The reveal finished and the game continues with another round.
    NextRound,
    /// The reveal finished and the session is over without winners.
    GameOver,
    /// The reveal finished and the last round produced winners.
    GameFinished,
    /// The game-over countdown or winners showcase finished.
    Restart,
}

/// Error returned when an event cannot be applied to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: RoundPhase,
    /// The event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: RoundPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// Phase graph of the round lifecycle.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    version: usize,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self {
            phase: RoundPhase::Welcome,
            version: 0,
        }
    }
}

impl RoundStateMachine {
    /// Create a new state machine initialised in the welcome phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = Self::compute_transition(self.phase, event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(
        from: RoundPhase,
        event: RoundEvent,
    ) -> Result<RoundPhase, InvalidTransition> {
        let next = match (from, event) {
            (_, RoundEvent::Reconnected) => RoundPhase::Welcome,
            (RoundPhase::Welcome, RoundEvent::WelcomeElapsed) => RoundPhase::Voting,
            (RoundPhase::Voting, RoundEvent::VotingClosed) => RoundPhase::Swapping,
            (RoundPhase::Swapping, RoundEvent::ResultRequested) => RoundPhase::Revealing,
            (RoundPhase::Revealing, RoundEvent::NextRound) => RoundPhase::Voting,
            (RoundPhase::Revealing, RoundEvent::GameOver) => RoundPhase::GameOver,
            (RoundPhase::Revealing, RoundEvent::GameFinished) => RoundPhase::Winners,
            (RoundPhase::GameOver | RoundPhase::Winners, RoundEvent::Restart) => {
                RoundPhase::Welcome
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
