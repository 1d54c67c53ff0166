//! # Greeter Telemetry
//!
//! Logging bootstrap shared by the latency runtime and the test suite.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use greeter_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! tracing::info!("ready");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GL_SERVICE_NAME` | `greeter-latency` | Service name in startup logs |
//! | `GL_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `GL_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `GL_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Initialize logging for the process.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let logging = init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _logging: logging,
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Shutting down telemetry");
    }
}
