//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive string
    pub log_level: String,

    /// Whether to write logs to the console at all
    pub console_output: bool,

    /// Whether to format logs as JSON
    pub json_logs: bool,

    /// Include thread names in log lines (useful to tell issuer from drain)
    pub thread_names: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "greeter-latency".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            thread_names: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GL_SERVICE_NAME`: Service name (default: greeter-latency)
    /// - `GL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `GL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `GL_JSON_LOGS`: Enable JSON logs (default: false outside containers)
    /// - `GL_THREAD_NAMES`: Include thread names (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("GL_SERVICE_NAME")
                .unwrap_or_else(|_| "greeter-latency".to_string()),

            log_level: env::var("GL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("GL_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("GL_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            thread_names: env::var("GL_THREAD_NAMES")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),
        }
    }

    /// Override the log level, e.g. from a `--verbose` flag.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Parse a boolean-ish environment value, falling back to `default` when the
/// value is not recognized.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
