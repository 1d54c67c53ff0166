//! Structured logging setup.
//!
//! Logs go to stderr so that stdout stays free for command output. Two
//! formats are supported:
//! - pretty, human-oriented lines for development
//! - JSON lines (`timestamp`, `level`, `target`, `threadName`, fields) for
//!   log shippers

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{TelemetryConfig, TelemetryError};

/// Handle returned once logging is installed.
#[derive(Debug)]
pub struct LoggingHandle {
    /// The filter directive that was applied.
    pub filter: String,
}

/// Install the global tracing subscriber.
///
/// Fails if the filter directive cannot be parsed or if a global subscriber
/// is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingHandle, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{}: {}", config.log_level, e)))?;

    let console_layer = if !config.console_output {
        None
    } else if config.json_logs {
        Some(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(config.thread_names)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
        )
    } else {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(config.thread_names)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true)
                .boxed(),
        )
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        filter = %config.log_level,
        json_logs = config.json_logs,
        "Structured logging initialized"
    );

    Ok(LoggingHandle {
        filter: config.log_level.clone(),
    })
}
