//! Hold-to-skip timer
//!
//! One cancellable deadline per session. Arming replaces any previous
//! deadline. The watchdog never sleeps on its own; the driver task awaits
//! [`SkipWatchdog::deadline`] and then calls back into the service.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct SkipWatchdog {
    threshold: Duration,
    deadline: Option<Instant>,
}

impl SkipWatchdog {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            deadline: None,
        }
    }

    pub fn arm(&mut self) {
        let deadline = Instant::now() + self.threshold;
        debug!("Skip watchdog armed for {:?}", self.threshold);
        self.deadline = Some(deadline);
    }

    /// Returns whether a deadline was pending
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.deadline.take().is_some();
        if was_armed {
            debug!("Skip watchdog cancelled");
        }
        was_armed
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Disarms and returns `true` once the deadline has passed
    pub fn take_elapsed(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
