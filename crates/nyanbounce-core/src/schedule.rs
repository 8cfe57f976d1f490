//! Stoppable periodic deadlines, polled by a single-threaded event loop.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Cadence {
    /// Created stopped; call [`Cadence::start`] to arm it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Returns true at most once per call when the deadline has passed. A cadence
    /// that fell more than one interval behind is rescheduled from `now` instead of
    /// firing a burst.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.interval;
                self.next_due = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }
}
