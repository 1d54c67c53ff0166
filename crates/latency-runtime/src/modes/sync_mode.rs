//! Mode A: issue, wait, record, repeat.

use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use greeter_client::{GreeterClient, LatencyRecorder, LatencySink, RunClock};

use super::{Mode, RunError, RunSummary};

/// Issue `count` calls one at a time, recording each before the next.
///
/// Sequence numbers run from 1 to `count`. The summary line is written only
/// when all `count` calls were recorded.
pub fn run_sync<S: LatencySink>(
    client: &GreeterClient,
    mut recorder: LatencyRecorder<S>,
    count: u64,
    clock: RunClock,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary, RunError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, count, "Starting synchronous run");

    let started = clock.elapsed();
    let mut issued = 0u64;
    let mut failed = 0u64;

    for number in 1..=count {
        if *shutdown.borrow() {
            info!(%run_id, issued, "Shutdown requested; stopping early");
            break;
        }

        let sent_time = clock.now_ns();
        let reply = client.say_hello(number as i64, sent_time)?;
        let received_time = clock.now_ns();
        issued += 1;

        let sample = recorder.record(&reply, sent_time, received_time)?;
        if sample.is_failure() {
            failed += 1;
        }
        debug!(number = reply.number, received_time, "Greeter received");
    }

    let elapsed = clock.elapsed().saturating_sub(started);
    let summary = (issued == count).then_some(elapsed);
    let stats = recorder.finish(summary)?;

    Ok(RunSummary {
        run_id,
        mode: Mode::Sync,
        issued,
        recorded: stats.samples,
        failed,
        elapsed,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeter_client::test_utils::echo_channel;
    use greeter_client::{EchoScript, MemoryLatencyLog};

    #[test]
    fn test_sync_run_writes_line_per_call_and_summary() {
        let (channel, transport) = echo_channel(EchoScript::new().failing(3)).unwrap();
        let client = GreeterClient::new(channel);
        let log = MemoryLatencyLog::new();
        let (_tx, rx) = watch::channel(false);

        let summary =
            run_sync(&client, LatencyRecorder::new(log.clone()), 5, RunClock::start(), rx).unwrap();
        assert_eq!(summary.issued, 5);
        assert_eq!(summary.recorded, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(transport.calls(), 5);

        let lines = log.lines();
        assert_eq!(lines.len(), 6);
        for (i, line) in lines[..5].iter().enumerate() {
            let number: i64 = line.split(' ').next().unwrap().parse().unwrap();
            assert_eq!(number, i as i64 + 1);
        }
        assert!(lines[2].ends_with(" RPC failed"));
        assert!(lines[5].starts_with("Total Latency: "));
    }

    #[test]
    fn test_sync_run_honours_shutdown() {
        let (channel, transport) = echo_channel(EchoScript::new()).unwrap();
        let client = GreeterClient::new(channel);
        let log = MemoryLatencyLog::new();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let summary = run_sync(
            &client,
            LatencyRecorder::new(log.clone()),
            10,
            RunClock::start(),
            rx,
        )
        .unwrap();
        assert_eq!(summary.issued, 0);
        assert_eq!(transport.calls(), 0);
        assert!(log.lines().is_empty());
    }
}
