//! Single-instance countdown driven by one-second ticks.
//!
//! The countdown itself holds no timer; the owner arms a repeating one-second
//! timer and feeds each fire into [`Countdown::tick`].

/// Result of a single countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Seconds left after this tick.
    pub remaining: u32,
    /// Set on the tick that reached zero; reported exactly once per countdown.
    pub completed: bool,
}

/// Round-level countdown. At most one is active at a time.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: Option<u32>,
}

impl Countdown {
    /// Create an idle countdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`, cancelling any countdown already running.
    ///
    /// Returns `true` when an active countdown was replaced.
    pub fn start(&mut self, seconds: u32) -> bool {
        self.remaining.replace(seconds).is_some()
    }

    /// Advance by one second. Returns `None` when no countdown is active.
    pub fn tick(&mut self) -> Option<Tick> {
        let remaining = self.remaining?.saturating_sub(1);
        if remaining == 0 {
            self.remaining = None;
        } else {
            self.remaining = Some(remaining);
        }

        Some(Tick {
            remaining,
            completed: remaining == 0,
        })
    }

    /// Stop the active countdown, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    /// Whether a countdown is running.
    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds left on the active countdown.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}
