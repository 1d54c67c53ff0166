//! Builds the channel, log and client for one measurement and runs it.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use greeter_client::{
    AsyncGreeterClient, Channel, ChannelCredentials, ChannelError, ChannelOptions, FileLatencyLog,
    GreeterClient, LatencyRecorder, RecordError, RunClock,
};

use crate::container::{RuntimeConfig, ASYNC_LOG_PATH, SYNC_LOG_PATH};
use crate::modes::{run_async, run_sync, CallLimit, RunError, RunSummary};

/// Which measurement to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    /// Mode A with this many calls.
    Sync { count: u64 },
    /// Mode B bounded by `limit`.
    Async { limit: CallLimit },
}

/// Errors from setting up or running a measurement.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("Failed to open latency log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Run(#[from] RunError),
}

impl LaunchError {
    /// Whether the process must abort instead of exiting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Run(e) if e.is_fatal())
    }
}

/// Run one measurement to completion. Blocks the calling thread.
///
/// Must not be called from inside an async runtime; use `spawn_blocking`.
pub fn launch(
    config: &RuntimeConfig,
    measurement: Measurement,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary, LaunchError> {
    let channel = Channel::create_with_options(
        &config.target,
        ChannelCredentials::Insecure,
        ChannelOptions {
            worker_threads: config.rpc_threads,
        },
    )?;
    let clock = RunClock::start();

    let summary = match measurement {
        Measurement::Sync { count } => {
            let log = open_log(config, SYNC_LOG_PATH)?;
            let client = GreeterClient::new(channel);
            run_sync(&client, LatencyRecorder::new(log), count, clock, shutdown)?
        }
        Measurement::Async { limit } => {
            let log = open_log(config, ASYNC_LOG_PATH)?;
            let client = AsyncGreeterClient::new(channel);
            run_async(&client, LatencyRecorder::new(log), limit, clock, shutdown)?
        }
    };
    Ok(summary)
}

/// How a supervised measurement ended.
#[derive(Debug)]
pub enum Supervised<T> {
    /// The measurement returned, with or without a shutdown request.
    Finished(T),
    /// A second interrupt arrived while the measurement was still waiting
    /// for outstanding calls.
    Abandoned,
}

/// Drive `measurement` until it returns or the operator gives up on it.
///
/// The first interrupt sends `true` on `shutdown` and keeps waiting, since
/// both modes finish their outstanding calls before returning. A call against
/// a hung peer never finishes, so a second interrupt returns
/// [`Supervised::Abandoned`] and leaves the measurement running.
pub async fn supervise<T, M, I, S>(
    measurement: M,
    shutdown: &watch::Sender<bool>,
    mut interrupt: I,
) -> io::Result<Supervised<T>>
where
    M: Future<Output = T>,
    I: FnMut() -> S,
    S: Future<Output = io::Result<()>>,
{
    tokio::pin!(measurement);

    tokio::select! {
        done = &mut measurement => return Ok(Supervised::Finished(done)),
        signal = interrupt() => signal?,
    }
    info!("Interrupt received; finishing outstanding calls (interrupt again to exit)");
    // The run may already have finished and dropped its receiver.
    let _ = shutdown.send(true);

    tokio::select! {
        done = &mut measurement => Ok(Supervised::Finished(done)),
        signal = interrupt() => {
            signal?;
            warn!("Second interrupt received; abandoning outstanding calls");
            Ok(Supervised::Abandoned)
        }
    }
}

fn open_log(config: &RuntimeConfig, default: &str) -> Result<FileLatencyLog, LaunchError> {
    let path = config.log_path_or(default);
    let log = FileLatencyLog::create(path).map_err(|source| LaunchError::Log {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %log.path().display(), "Writing latency samples");
    Ok(log)
}
