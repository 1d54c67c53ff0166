//! # Fixed Scenarios
//!
//! Small, deterministic runs that pin down the log format and the handling of
//! failed and reordered calls.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::watch;

    use greeter_client::test_utils::echo_channel;
    use greeter_client::{
        AsyncGreeterClient, CompletionDrain, EchoScript, FileLatencyLog, GreeterClient,
        LatencyRecorder, MemoryLatencyLog, RunClock,
    };
    use latency_runtime::run_sync;

    use crate::integration::parse_line;

    // =============================================================================
    // SINGLE CALL
    // =============================================================================

    #[test]
    fn test_echo_success_line() {
        let (channel, _) = echo_channel(EchoScript::new()).unwrap();
        let client = GreeterClient::new(channel);
        let log = MemoryLatencyLog::new();
        let mut recorder = LatencyRecorder::new(log.clone());

        let reply = client.say_hello(1, 1000).unwrap();
        recorder.record(&reply, 1000, 13_345).unwrap();

        assert_eq!(log.lines(), vec!["1 1000 13345 12345".to_string()]);
    }

    #[test]
    fn test_failed_call_recorded_with_marker() {
        let (channel, _) = echo_channel(EchoScript::new().failing(1)).unwrap();
        let client = AsyncGreeterClient::new(channel);
        let clock = RunClock::start();
        let log = MemoryLatencyLog::new();

        client.say_hello(1, clock.now_ns()).unwrap();
        client.shutdown();

        let queue = client.completion_queue();
        let report = CompletionDrain::new(queue.clone(), LatencyRecorder::new(log.clone()), clock)
            .run()
            .unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(queue.outstanding(), 0);

        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        let (number, sent, received, delta, failed) = parse_line(&lines[0]);
        assert_eq!(number, 1);
        assert!(failed);
        assert_eq!(delta, received - sent);
    }

    // =============================================================================
    // MODE A: FULL DEFAULT RUN
    // =============================================================================

    #[test]
    fn test_sync_run_of_default_length() {
        let (channel, transport) = echo_channel(EchoScript::new()).unwrap();
        let client = GreeterClient::new(channel);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LatencyTest.log");
        let (_tx, rx) = watch::channel(false);

        let summary = run_sync(
            &client,
            LatencyRecorder::new(FileLatencyLog::create(&path).unwrap()),
            100_000,
            RunClock::start(),
            rx,
        )
        .unwrap();
        assert_eq!(summary.issued, 100_000);
        assert_eq!(transport.calls(), 100_000);
        assert_eq!(transport.max_in_flight(), 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 100_001);
        assert!(lines[100_000].starts_with("Total Latency: "));

        for (i, line) in lines[..100_000].iter().enumerate() {
            let (number, sent, received, delta, failed) = parse_line(line);
            assert_eq!(number, i as i64 + 1, "lines must follow issue order");
            assert!(received >= sent);
            assert_eq!(delta, received - sent);
            assert!(!failed);
        }
    }

    // =============================================================================
    // MODE B: REORDERED COMPLETIONS
    // =============================================================================

    #[test]
    fn test_second_call_completing_first_is_logged_first() {
        let script = EchoScript::new()
            .with_delay(1, Duration::from_millis(200))
            .with_delay(2, Duration::from_millis(10));
        let (channel, _) = echo_channel(script).unwrap();
        let client = AsyncGreeterClient::new(channel);
        let clock = RunClock::start();
        let log = MemoryLatencyLog::new();

        let drain = CompletionDrain::new(
            client.completion_queue(),
            LatencyRecorder::new(log.clone()),
            clock,
        );
        let drain_thread = std::thread::spawn(move || drain.run());

        client.say_hello(1, clock.now_ns()).unwrap();
        client.say_hello(2, clock.now_ns()).unwrap();
        client.shutdown();

        let report = drain_thread.join().unwrap().unwrap();
        assert_eq!(report.completed, 2);

        let numbers: Vec<i64> = log.lines().iter().map(|l| parse_line(l).0).collect();
        assert_eq!(numbers, vec![2, 1]);
    }
}
