//! # Measurement Modes
//!
//! - [`run_sync`]: mode A. One call at a time, each waited on before the next.
//! - [`run_async`]: mode B. Back-to-back issuing while a dedicated thread
//!   drains completions.
//!
//! Both modes stop early when the shutdown watch flips to `true`.

mod async_mode;
mod sync_mode;

pub use async_mode::{run_async, CallLimit, DRAIN_THREAD_NAME};
pub use sync_mode::run_sync;

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use greeter_client::{CallError, DrainError, LatencySnapshot, RecordError};

/// Which mode produced a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Synchronous wait per call.
    Sync,
    /// Fire-and-forget with a background drain.
    Async,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Async => f.write_str("async"),
        }
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Call failed: {0}")]
    Call(#[from] CallError),

    #[error("Completion drain failed: {0}")]
    Drain(#[from] DrainError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Failed to spawn completion drain thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Completion drain thread panicked")]
    DrainPanicked,
}

impl RunError {
    /// Whether the completion machinery broke and the process must abort.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Call(e) => e.is_fatal(),
            Self::Drain(DrainError::NotificationFailure { .. }) => true,
            Self::DrainPanicked => true,
            Self::Drain(DrainError::Record(_)) | Self::Record(_) | Self::Spawn(_) => false,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Identifier attached to the run's log lines.
    pub run_id: Uuid,
    pub mode: Mode,
    /// Calls issued.
    pub issued: u64,
    /// Samples recorded.
    pub recorded: u64,
    /// Recorded calls that failed remotely.
    pub failed: u64,
    /// Wall time from first issue to last record.
    pub elapsed: Duration,
    pub stats: LatencySnapshot,
}

impl RunSummary {
    /// Log the summary at info level.
    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            mode = %self.mode,
            issued = self.issued,
            recorded = self.recorded,
            failed = self.failed,
            elapsed_secs = self.elapsed.as_secs_f64(),
            mean_ns = self.stats.mean_ns,
            min_ns = self.stats.min_ns,
            max_ns = self.stats.max_ns,
            "Run finished"
        );
    }
}
