//! Self-gating cadence for poll-driven units.
//!
//! Every unit of the controller is polled from one fast cooperative loop and
//! decides on its own whether its periodic work is due. Time is a monotonic
//! millisecond counter supplied by the caller, so units never read a clock
//! themselves and tests can drive time explicitly.

/// Tracks when a periodic task last ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleClock {
    /// Sample period in milliseconds.
    period_ms: u64,
    /// Time the task last ran, `None` before the first run.
    last_ms: Option<u64>,
}

impl SampleClock {
    /// Create a clock that fires on the first poll and then every `period_ms`.
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// Create a clock that first fires one full period after `start_ms`.
    pub const fn starting_at(period_ms: u64, start_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: Some(start_ms),
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn last_ms(&self) -> Option<u64> {
        self.last_ms
    }

    /// Check if the task is due at `now_ms`.
    ///
    /// A clock that went backwards (`now_ms` before the last run) is not due.
    pub fn should_sample(&self, now_ms: u64) -> bool {
        match self.last_ms {
            None => true,
            Some(last) => now_ms.checked_sub(last).is_some_and(|d| d >= self.period_ms),
        }
    }

    /// Record that the task ran at `now_ms`.
    pub fn mark(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }

    /// Check and mark in one step. Returns `true` when the task should run now.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.should_sample(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }

    /// Forget the last run so the next poll fires immediately.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }

    /// Get the time until the task is next due.
    pub fn time_until_sample(&self, now_ms: u64) -> u64 {
        match self.last_ms {
            None => 0,
            Some(last) => (last + self.period_ms).saturating_sub(now_ms),
        }
    }
}
