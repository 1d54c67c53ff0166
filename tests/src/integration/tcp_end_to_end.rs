//! # TCP End-to-End
//!
//! Full measurements through `launch`, against an echo server on loopback.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::watch;

    use greeter_client::{EchoScript, EchoServer};
    use latency_runtime::{launch, CallLimit, Measurement, RuntimeConfig};

    use crate::integration::parse_line;

    fn config_for(server: &EchoServer, log: &std::path::Path) -> RuntimeConfig {
        RuntimeConfig {
            target: server.local_addr().to_string(),
            log_path: Some(log.to_path_buf()),
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sync_measurement_over_tcp() {
        let server = EchoServer::bind("127.0.0.1:0", EchoScript::new().failing(7))
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LatencyTest.log");
        let config = config_for(&server, &path);
        let (_tx, rx) = watch::channel(false);

        let summary = tokio::task::spawn_blocking(move || {
            launch(&config, Measurement::Sync { count: 50 }, rx)
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(summary.recorded, 50);
        assert_eq!(summary.failed, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 51);
        for (i, line) in lines[..50].iter().enumerate() {
            let (number, _, _, _, failed) = parse_line(line);
            assert_eq!(number, i as i64 + 1);
            assert_eq!(failed, number == 7);
        }
        assert!(lines[50].starts_with("Total Latency: "));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_measurement_over_tcp() {
        let script = EchoScript::new()
            .with_default_delay(Duration::from_millis(2))
            .with_jitter(Duration::from_millis(5));
        let server = EchoServer::bind("127.0.0.1:0", script).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AsyncLatencyTest.log");
        let config = config_for(&server, &path);
        let (_tx, rx) = watch::channel(false);

        let summary = tokio::task::spawn_blocking(move || {
            launch(
                &config,
                Measurement::Async {
                    limit: CallLimit::Count(300),
                },
                rx,
            )
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(summary.issued, 300);
        assert_eq!(summary.recorded, 300);
        assert_eq!(summary.failed, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut numbers: Vec<i64> = content.lines().map(|l| parse_line(l).0).collect();
        assert_eq!(numbers.len(), 300);
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=300).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_measurement_without_server_records_failures() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AsyncLatencyTest.log");
        let config = RuntimeConfig {
            target: addr.to_string(),
            log_path: Some(path.clone()),
            ..RuntimeConfig::default()
        };
        let (_tx, rx) = watch::channel(false);

        let summary = tokio::task::spawn_blocking(move || {
            launch(
                &config,
                Measurement::Async {
                    limit: CallLimit::Count(20),
                },
                rx,
            )
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(summary.recorded, 20);
        assert_eq!(summary.failed, 20);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().all(|l| parse_line(l).4));
    }
}
