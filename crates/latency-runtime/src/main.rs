//! # greeter-latency
//!
//! Measures round-trip latency of unary `SayHello` calls.
//!
//! ```text
//! greeter-latency sync --count 100000
//! greeter-latency async --forever
//! greeter-latency serve --listen 127.0.0.1:50051
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};

use greeter_client::{EchoScript, EchoServer};
use greeter_telemetry::{init_telemetry, TelemetryConfig};
use latency_runtime::{launch, supervise, CallLimit, Measurement, RuntimeConfig, Supervised};

/// Round-trip latency measurement for the greeter service
#[derive(Parser, Debug)]
#[command(name = "greeter-latency")]
#[command(about = "Measure per-call latency of unary greeter RPCs")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Greeter endpoint (host:port) [env: GL_TARGET]
    #[arg(short, long, global = true)]
    target: Option<String>,

    /// Latency log path [env: GL_LOG_PATH]
    #[arg(short, long, global = true)]
    log_path: Option<PathBuf>,

    /// Worker threads of the RPC runtime [env: GL_RPC_THREADS]
    #[arg(long, global = true)]
    rpc_threads: Option<usize>,

    /// Log at debug level, overriding GL_LOG_LEVEL
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue calls one at a time, waiting for each
    Sync {
        /// Calls to issue [env: GL_CALL_COUNT]
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// Issue calls back to back while a background thread drains completions
    Async {
        /// Calls to issue [env: GL_CALL_COUNT]
        #[arg(short = 'n', long, conflicts_with = "forever")]
        count: Option<u64>,

        /// Issue until Ctrl-C
        #[arg(long)]
        forever: bool,
    },

    /// Run a local echo peer
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:50051")]
        listen: String,

        /// Delay before every answer, in microseconds
        #[arg(long, default_value_t = 0)]
        delay_us: u64,

        /// Random extra delay up to this many microseconds
        #[arg(long, default_value_t = 0)]
        jitter_us: u64,
    },
}

impl Args {
    fn apply(&self, config: &mut RuntimeConfig) {
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(path) = &self.log_path {
            config.log_path = Some(path.clone());
        }
        if let Some(threads) = self.rpc_threads {
            config.rpc_threads = threads;
        }
        match &self.command {
            Command::Sync { count: Some(count) } | Command::Async { count: Some(count), .. } => {
                config.call_count = Some(*count);
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if args.verbose {
        telemetry = telemetry.with_log_level("debug");
    }
    let _telemetry = init_telemetry(telemetry).context("Failed to initialize logging")?;

    let mut config = RuntimeConfig::from_env().context("Invalid environment configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let measurement = match args.command {
        Command::Serve {
            listen,
            delay_us,
            jitter_us,
        } => {
            let script = EchoScript::new()
                .with_default_delay(Duration::from_micros(delay_us))
                .with_jitter(Duration::from_micros(jitter_us));
            return serve(&listen, script).await;
        }
        Command::Sync { .. } => Measurement::Sync {
            count: config.effective_call_count(),
        },
        Command::Async { forever: true, .. } => Measurement::Async {
            limit: CallLimit::Forever,
        },
        Command::Async { .. } => Measurement::Async {
            limit: CallLimit::Count(config.effective_call_count()),
        },
    };

    info!(peer = %config.target, ?measurement, "Starting measurement");
    measure(config, measurement).await
}

async fn measure(config: RuntimeConfig, measurement: Measurement) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = tokio::task::spawn_blocking(move || launch(&config, measurement, shutdown_rx));

    let joined = match supervise(&mut task, &shutdown_tx, tokio::signal::ctrl_c)
        .await
        .context("Failed to listen for Ctrl-C")?
    {
        Supervised::Finished(joined) => joined,
        Supervised::Abandoned => {
            warn!("Exiting with calls still outstanding; the latency log may be incomplete");
            std::process::exit(130);
        }
    };

    match joined.context("Measurement thread panicked")? {
        Ok(summary) => {
            summary.log();
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!(error = %e, "Completion notification failed; aborting");
            std::process::abort();
        }
        Err(e) => Err(e).context("Measurement failed"),
    }
}

async fn serve(listen: &str, script: EchoScript) -> Result<()> {
    let server = EchoServer::bind(listen, script)
        .await
        .with_context(|| format!("Failed to bind echo server on {listen}"))?;
    info!(addr = %server.local_addr(), "Echo server running. Press Ctrl+C to stop.");

    tokio::select! {
        served = server.wait() => served.context("Echo server failed")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Ctrl-C received; stopping echo server");
        }
    }
    Ok(())
}
