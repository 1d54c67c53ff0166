//! Monotonic run clock.
//!
//! Every timestamp in a run is nanoseconds since the run's epoch, taken from
//! `Instant`. Deltas between two readings of the same clock are never
//! negative and never wrap at a second boundary.

use std::time::{Duration, Instant};

/// Nanosecond clock anchored at the start of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    epoch: Instant,
}

impl RunClock {
    /// Start a new clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Nanoseconds elapsed since the epoch.
    ///
    /// Saturates at `i64::MAX` (about 292 years).
    pub fn now_ns(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }

    /// Wall-clock time since the epoch.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }
}

impl Default for RunClock {
    fn default() -> Self {
        Self::start()
    }
}
