//! Debounce timer

use std::time::Duration;

/// Coalesces bursts of triggers into one firing after a quiet window.
///
/// The timer holds at most one deadline. A trigger while pending moves the
/// deadline; firing or cancelling clears it.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule, or reschedule, the firing to `now + window`
    pub fn trigger(&mut self, now: Duration) {
        self.deadline = Some(now + self.window);
    }

    /// Fire if the window has elapsed with no further trigger
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending firing
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Time left until the pending firing
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_sub(now))
    }
}
