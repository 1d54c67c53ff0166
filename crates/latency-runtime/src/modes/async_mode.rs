//! Mode B: issue back to back while a dedicated thread drains completions.

use std::thread;

use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use greeter_client::{AsyncGreeterClient, CompletionDrain, LatencyRecorder, LatencySink, RunClock};

use super::{Mode, RunError, RunSummary};

/// Name of the thread that drains the completion queue.
pub const DRAIN_THREAD_NAME: &str = "completion-drain";

/// How many calls an async run issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLimit {
    /// Stop after this many calls.
    Count(u64),
    /// Issue until shutdown is requested.
    Forever,
}

impl CallLimit {
    fn allows(self, issued: u64) -> bool {
        match self {
            Self::Count(limit) => issued < limit,
            Self::Forever => true,
        }
    }
}

/// Issue calls without waiting until `limit` is reached or shutdown is
/// requested, then shut the queue down and wait for the drain to finish.
///
/// Issuing also stops if the drain thread exits on its own. Every issued
/// call is recorded before this returns successfully.
pub fn run_async<S: LatencySink + 'static>(
    client: &AsyncGreeterClient,
    recorder: LatencyRecorder<S>,
    limit: CallLimit,
    clock: RunClock,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary, RunError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, ?limit, "Starting asynchronous run");

    let started = clock.elapsed();
    let drain = CompletionDrain::new(client.completion_queue(), recorder, clock);
    let drain_thread = thread::Builder::new()
        .name(DRAIN_THREAD_NAME.to_string())
        .spawn(move || drain.run())
        .map_err(RunError::Spawn)?;

    let mut issued = 0u64;
    let issuing = loop {
        if *shutdown.borrow() {
            info!(%run_id, issued, "Shutdown requested; stopping issue loop");
            break Ok(());
        }
        if !limit.allows(issued) {
            break Ok(());
        }
        if drain_thread.is_finished() {
            warn!(%run_id, issued, "Completion drain exited early; stopping issue loop");
            break Ok(());
        }

        let number = issued as i64 + 1;
        if let Err(e) = client.say_hello(number, clock.now_ns()) {
            break Err(e);
        }
        issued += 1;
    };

    client.shutdown();
    let queue = client.completion_queue();
    info!(%run_id, issued, outstanding = queue.outstanding(), "Waiting for completion drain");

    let report = drain_thread.join().map_err(|_| RunError::DrainPanicked)??;
    issuing?;

    Ok(RunSummary {
        run_id,
        mode: Mode::Async,
        issued,
        recorded: report.completed,
        failed: report.failed,
        elapsed: clock.elapsed().saturating_sub(started),
        stats: report.stats,
    })
}
