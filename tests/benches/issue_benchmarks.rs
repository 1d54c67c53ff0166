//! # Issue Path Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Mode A | prepare, start, register, wait, reply per call |
//! | Mode B | a batch issued back to back and drained on another thread |

use std::thread;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use greeter_client::test_utils::echo_channel;
use greeter_client::{
    AsyncGreeterClient, CompletionDrain, EchoScript, GreeterClient, LatencyRecorder,
    MemoryLatencyLog, RunClock,
};

// ============================================================================
// MODE A
// ============================================================================

fn bench_sync_issue(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync-issue");
    group.measurement_time(Duration::from_secs(5));

    let (channel, _) = echo_channel(EchoScript::new()).expect("channel");
    let client = GreeterClient::new(channel);
    let clock = RunClock::start();
    let mut number = 0i64;

    group.throughput(Throughput::Elements(1));
    group.bench_function("say_hello_immediate_echo", |b| {
        b.iter(|| {
            number += 1;
            black_box(client.say_hello(number, clock.now_ns()).expect("call"))
        })
    });

    group.finish();
}

// ============================================================================
// MODE B
// ============================================================================

fn bench_async_issue(c: &mut Criterion) {
    let mut group = c.benchmark_group("async-issue");
    group.measurement_time(Duration::from_secs(5));

    for batch in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::new("issue_and_drain", batch), &batch, |b, &batch| {
            b.iter(|| {
                let (channel, _) = echo_channel(EchoScript::new()).expect("channel");
                let client = AsyncGreeterClient::new(channel);
                let clock = RunClock::start();
                let drain = CompletionDrain::new(
                    client.completion_queue(),
                    LatencyRecorder::new(MemoryLatencyLog::new()),
                    clock,
                );
                let drain_thread = thread::spawn(move || drain.run());

                for n in 1..=batch as i64 {
                    client.say_hello(n, clock.now_ns()).expect("issue");
                }
                client.shutdown();
                black_box(drain_thread.join().expect("drain thread").expect("drain"))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sync_issue, bench_async_issue);
criterion_main!(benches);
