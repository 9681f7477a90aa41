/// Running vote count for the active voting phase.
#[derive(Debug, Default)]
pub struct VoteTally {
    total: u64,
}

impl VoteTally {
    /// Create a tally starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the tally at the start of a voting phase.
    pub fn reset(&mut self) {
        self.total = 0;
    }

    /// Add a reported increment, returning the new total.
    pub fn add(&mut self, delta: u32) -> u64 {
        self.total = self.total.saturating_add(u64::from(delta));
        self.total
    }

    /// Votes counted since the last reset.
    pub fn current(&self) -> u64 {
        self.total
    }
}
