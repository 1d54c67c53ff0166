//! Latency recorder: turns completed replies into persisted samples.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use shared_types::HelloReply;

use crate::domain::{LatencySample, LatencySnapshot, LatencyStats, RecordError};
use crate::ports::LatencySink;

/// Computes one sample per completed call and appends it to a sink.
pub struct LatencyRecorder<S: LatencySink> {
    sink: S,
    stats: Arc<LatencyStats>,
}

impl<S: LatencySink> LatencyRecorder<S> {
    /// Recorder writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            stats: Arc::new(LatencyStats::new()),
        }
    }

    /// Record one completed call.
    ///
    /// `sent_time` is the start time the issuer captured locally and
    /// `received_time` the moment the completion was observed, both on the
    /// run clock.
    pub fn record(
        &mut self,
        reply: &HelloReply,
        sent_time: i64,
        received_time: i64,
    ) -> Result<LatencySample, RecordError> {
        if !reply.is_error() && reply.time_start != sent_time {
            warn!(
                number = reply.number,
                echoed = reply.time_start,
                local = sent_time,
                "Echoed start time differs from local start time"
            );
        }

        let sample = LatencySample::new(reply, sent_time, received_time);
        self.sink.append(&sample)?;
        self.stats.observe(&sample);
        Ok(sample)
    }

    /// Shared view of the running statistics.
    pub fn stats_handle(&self) -> Arc<LatencyStats> {
        Arc::clone(&self.stats)
    }

    /// Samples recorded so far.
    pub fn recorded(&self) -> u64 {
        self.stats.samples()
    }

    /// Write the summary line (if `elapsed` is given) and flush.
    pub fn finish(&mut self, elapsed: Option<Duration>) -> Result<LatencySnapshot, RecordError> {
        if let Some(elapsed) = elapsed {
            self.sink.append_summary(elapsed)?;
        }
        self.sink.flush()?;

        let snapshot = self.stats.snapshot();
        info!(
            samples = snapshot.samples,
            failures = snapshot.failures,
            min_ns = snapshot.min_ns,
            mean_ns = snapshot.mean_ns,
            max_ns = snapshot.max_ns,
            "Latency recording finished"
        );
        Ok(snapshot)
    }

}
