//! # Completion Drain
//!
//! Consumer loop for a shared completion queue. Pulls completions until the
//! queue reports `Closed`, records one latency sample per call, and stops
//! hard on a failed notification.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::completion_queue::{Completion, CompletionQueue, QueueEvent};
use super::recorder::LatencyRecorder;
use crate::domain::{DrainError, LatencySnapshot, RunClock};
use crate::ports::LatencySink;

/// What a finished drain saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Completions recorded.
    pub completed: u64,
    /// Of those, calls that failed remotely.
    pub failed: u64,
    /// Latency statistics over every recorded call.
    pub stats: LatencySnapshot,
}

/// Drains a completion queue into a latency recorder.
pub struct CompletionDrain<S: LatencySink> {
    queue: Arc<CompletionQueue>,
    recorder: LatencyRecorder<S>,
    clock: RunClock,
}

impl<S: LatencySink> CompletionDrain<S> {
    /// Drain `queue` into `recorder`, timestamping with `clock`.
    ///
    /// `clock` must be the clock the issuer used for start times.
    pub fn new(queue: Arc<CompletionQueue>, recorder: LatencyRecorder<S>, clock: RunClock) -> Self {
        Self {
            queue,
            recorder,
            clock,
        }
    }

    /// Run until the queue closes. Blocks the calling thread.
    pub fn run(mut self) -> Result<DrainReport, DrainError> {
        let mut completed = 0u64;
        let mut failed = 0u64;
        info!("Completion drain started");

        while let QueueEvent::Completed(Completion { tag, ok, record }) = self.queue.next() {
            let received_time = self.clock.now_ns();
            if !ok {
                error!(%tag, "Completion notification failed");
                return Err(DrainError::NotificationFailure { tag });
            }

            let number = record.sequence_number();
            let sent_time = record.start_time();
            let reply = record.into_reply();
            if reply.number != number {
                warn!(%tag, number, echoed = reply.number, "Echoed sequence number differs");
            }

            let sample = self.recorder.record(&reply, sent_time, received_time)?;
            completed += 1;
            if sample.is_failure() {
                debug!(%tag, number, "Recorded failed call");
                failed += 1;
            }
        }

        let stats = self.recorder.finish(None)?;
        info!(completed, failed, "Completion drain finished");
        Ok(DrainReport {
            completed,
            failed,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{EchoScript, MemoryLatencyLog};
    use crate::service::issuer::AsyncGreeterClient;
    use crate::test_utils::echo_channel;
    use std::time::Duration;

    #[test]
    fn test_drain_records_every_call() {
        let (channel, _) = echo_channel(EchoScript::new().failing(3)).unwrap();
        let client = AsyncGreeterClient::new(channel);
        let clock = RunClock::start();
        let log = MemoryLatencyLog::new();

        for n in 1..=5 {
            client.say_hello(n, clock.now_ns()).unwrap();
        }
        client.shutdown();

        let drain = CompletionDrain::new(
            client.completion_queue(),
            LatencyRecorder::new(log.clone()),
            clock,
        );
        let report = drain.run().unwrap();
        assert_eq!(report.completed, 5);
        assert_eq!(report.failed, 1);
        assert_eq!(report.stats.samples, 5);

        let lines = log.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines.iter().filter(|line| line.ends_with(" RPC failed")).count(),
            1
        );
    }

    #[test]
    fn test_drain_lines_in_completion_order() {
        let script = EchoScript::new()
            .with_delay(1, Duration::from_millis(150))
            .with_delay(2, Duration::from_millis(5));
        let (channel, _) = echo_channel(script).unwrap();
        let client = AsyncGreeterClient::new(channel);
        let clock = RunClock::start();
        let log = MemoryLatencyLog::new();

        client.say_hello(1, clock.now_ns()).unwrap();
        client.say_hello(2, clock.now_ns()).unwrap();
        client.shutdown();

        CompletionDrain::new(client.completion_queue(), LatencyRecorder::new(log.clone()), clock)
            .run()
            .unwrap();

        let numbers: Vec<_> = log
            .lines()
            .iter()
            .map(|line| line.split(' ').next().unwrap().to_string())
            .collect();
        assert_eq!(numbers, vec!["2", "1"]);
    }

    #[test]
    fn test_drain_stops_after_closed() {
        let (channel, _) = echo_channel(EchoScript::new()).unwrap();
        let client = AsyncGreeterClient::new(channel);
        client.say_hello(1, 0).unwrap();
        client.shutdown();

        let queue = client.completion_queue();
        CompletionDrain::new(
            Arc::clone(&queue),
            LatencyRecorder::new(MemoryLatencyLog::new()),
            RunClock::start(),
        )
        .run()
        .unwrap();
        assert_eq!(queue.pulls(), 2);
    }

    #[test]
    fn test_drain_fails_on_notification_failure() {
        let (channel, _) = echo_channel(EchoScript::new().panicking(2)).unwrap();
        let client = AsyncGreeterClient::new(channel);
        client.say_hello(2, 0).unwrap();
        client.shutdown();

        let err = CompletionDrain::new(
            client.completion_queue(),
            LatencyRecorder::new(MemoryLatencyLog::new()),
            RunClock::start(),
        )
        .run()
        .unwrap_err();
        assert!(matches!(err, DrainError::NotificationFailure { .. }));
    }
}
