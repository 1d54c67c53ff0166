//! Latency samples and running statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use shared_types::HelloReply;

/// One persisted measurement.
///
/// Rendered as a single space-separated line:
///
/// ```text
/// <sequence_number> <sent_time> <received_time> <delta>[ <error>]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySample {
    /// Sequence number echoed by the reply
    pub sequence_number: i64,
    /// Start timestamp echoed by the reply
    pub sent_time: i64,
    /// Timestamp at which the completion was observed
    pub received_time: i64,
    /// `received_time` minus the locally captured start time
    pub delta: i64,
    /// Error marker, present for failed calls
    pub error: Option<String>,
}

impl LatencySample {
    /// Build a sample from a completed reply.
    ///
    /// The delta is measured against `local_sent_time`, the timestamp the
    /// issuer captured itself, not against the echoed value.
    #[must_use]
    pub fn new(reply: &HelloReply, local_sent_time: i64, received_time: i64) -> Self {
        Self {
            sequence_number: reply.number,
            sent_time: reply.time_start,
            received_time,
            delta: received_time.saturating_sub(local_sent_time),
            error: reply.error.clone(),
        }
    }

    /// Whether the sample records a failed call.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for LatencySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.sequence_number, self.sent_time, self.received_time, self.delta
        )?;
        if let Some(error) = &self.error {
            write!(f, " {error}")?;
        }
        Ok(())
    }
}

/// Thread-safe running statistics over recorded samples.
///
/// Shared behind an `Arc` so another thread can watch progress while the
/// recorder is writing.
#[derive(Debug)]
pub struct LatencyStats {
    samples: AtomicU64,
    failures: AtomicU64,
    total_ns: AtomicU64,
    min_ns: AtomicU64,
    max_ns: AtomicU64,
}

impl LatencyStats {
    /// Empty statistics.
    pub fn new() -> Self {
        Self {
            samples: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            total_ns: AtomicU64::new(0),
            min_ns: AtomicU64::new(u64::MAX),
            max_ns: AtomicU64::new(0),
        }
    }

    /// Fold one sample in. Negative deltas count as zero.
    pub fn observe(&self, sample: &LatencySample) {
        let delta = u64::try_from(sample.delta).unwrap_or(0);
        self.samples.fetch_add(1, Ordering::Relaxed);
        if sample.is_failure() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_ns.fetch_add(delta, Ordering::Relaxed);
        self.min_ns.fetch_min(delta, Ordering::Relaxed);
        self.max_ns.fetch_max(delta, Ordering::Relaxed);
    }

    /// Number of samples observed so far.
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> LatencySnapshot {
        let samples = self.samples.load(Ordering::Relaxed);
        let total_ns = self.total_ns.load(Ordering::Relaxed);
        LatencySnapshot {
            samples,
            failures: self.failures.load(Ordering::Relaxed),
            min_ns: if samples == 0 {
                0
            } else {
                self.min_ns.load(Ordering::Relaxed)
            },
            max_ns: self.max_ns.load(Ordering::Relaxed),
            mean_ns: if samples == 0 { 0 } else { total_ns / samples },
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`LatencyStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySnapshot {
    /// Samples recorded
    pub samples: u64,
    /// Samples that recorded a failed call
    pub failures: u64,
    /// Smallest delta (0 when empty)
    pub min_ns: u64,
    /// Largest delta
    pub max_ns: u64,
    /// Mean delta
    pub mean_ns: u64,
}
