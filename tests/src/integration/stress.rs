//! # Stress Tests
//!
//! Many outstanding calls against a slow, jittery peer.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use tokio::sync::watch;

    use greeter_client::test_utils::echo_channel;
    use greeter_client::{
        AsyncGreeterClient, CompletionQueue, EchoScript, LatencyRecorder, MemoryLatencyLog,
        QueueEvent, RunClock,
    };
    use latency_runtime::{run_async, CallLimit};

    use crate::integration::parse_line;

    fn slow_script() -> EchoScript {
        EchoScript::new()
            .with_default_delay(Duration::from_millis(20))
            .with_jitter(Duration::from_millis(20))
    }

    #[test]
    fn test_async_run_yields_one_completion_per_call() {
        const CALLS: u64 = 2_000;
        let (channel, transport) = echo_channel(slow_script()).unwrap();
        let client = AsyncGreeterClient::new(channel);
        let log = MemoryLatencyLog::new();
        let (_tx, rx) = watch::channel(false);

        let summary = run_async(
            &client,
            LatencyRecorder::new(log.clone()),
            CallLimit::Count(CALLS),
            RunClock::start(),
            rx,
        )
        .unwrap();

        assert_eq!(summary.issued, CALLS);
        assert_eq!(summary.recorded, CALLS);
        assert!(transport.max_in_flight() > 1, "calls should overlap");

        let lines = log.lines();
        assert_eq!(lines.len() as u64, CALLS);
        let mut seen = HashSet::new();
        for line in &lines {
            let (number, sent, received, delta, failed) = parse_line(line);
            assert!(seen.insert(number), "sequence number {number} recorded twice");
            assert!(received >= sent);
            assert!(delta >= 0);
            assert!(!failed);
        }
        assert_eq!(seen, (1..=CALLS as i64).collect());

        // One pull per completion plus the one that saw Closed.
        let queue = client.completion_queue();
        assert_eq!(queue.pulls(), CALLS + 1);
        assert!(matches!(queue.next(), QueueEvent::Closed));
    }

    #[test]
    fn test_tags_never_reused_while_outstanding() {
        const CALLS: i64 = 500;
        let (channel, _) = echo_channel(slow_script()).unwrap();
        let queue = Arc::new(CompletionQueue::new());
        let client = AsyncGreeterClient::with_queue(channel, Arc::clone(&queue));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut tags = Vec::new();
                while let QueueEvent::Completed(completion) = queue.next() {
                    assert!(completion.ok);
                    assert_eq!(
                        completion.record.reply().number,
                        completion.record.sequence_number()
                    );
                    tags.push(completion.tag);
                }
                tags
            })
        };

        let mut issued = HashSet::new();
        for n in 1..=CALLS {
            let tag = client.say_hello(n, n).unwrap();
            assert!(issued.insert(tag), "tag {tag} issued twice");
        }
        client.shutdown();

        let completed = consumer.join().unwrap();
        assert_eq!(completed.len(), CALLS as usize);
        let completed: HashSet<_> = completed.into_iter().collect();
        assert_eq!(completed, issued);
    }

    #[test]
    fn test_failures_mixed_into_large_run() {
        const CALLS: u64 = 1_000;
        let mut script = slow_script();
        for n in (10..=1_000).step_by(10) {
            script = script.failing(n);
        }
        let (channel, _) = echo_channel(script).unwrap();
        let client = AsyncGreeterClient::new(channel);
        let log = MemoryLatencyLog::new();
        let (_tx, rx) = watch::channel(false);

        let summary = run_async(
            &client,
            LatencyRecorder::new(log.clone()),
            CallLimit::Count(CALLS),
            RunClock::start(),
            rx,
        )
        .unwrap();

        assert_eq!(summary.recorded, CALLS);
        assert_eq!(summary.failed, 100);
        for line in log.lines() {
            let (number, _, _, _, failed) = parse_line(&line);
            assert_eq!(failed, number % 10 == 0);
        }
    }
}
