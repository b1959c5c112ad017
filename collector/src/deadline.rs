use std::time::{
    Duration,
    Instant,
};

/// A single point in time by which the whole run has to be finished.
///
/// Created once per orchestration call and handed to every blocking operation, which then
/// waits for at most [`Deadline::clamp`] of its own timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Time left, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_none()
    }

    /// The smaller of `timeout` and the time left. `None` once expired.
    pub fn clamp(&self, timeout: Duration) -> Option<Duration> {
        self.remaining().map(|left| left.min(timeout))
    }
}
