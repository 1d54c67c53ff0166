//! # Runtime Configuration
//!
//! Defaults, environment overrides and validation. Command-line flags are
//! applied on top by the binary before [`RuntimeConfig::validate`] runs.

use std::path::{Path, PathBuf};

use thiserror::Error;

use greeter_client::DEFAULT_RPC_THREADS;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_TARGET: &str = "localhost:50051";

/// Calls issued by a bounded run when no count is configured.
pub const DEFAULT_CALL_COUNT: u64 = 100_000;

/// Mode A log location.
pub const SYNC_LOG_PATH: &str = "./LatencyTest.log";

/// Mode B log location.
pub const ASYNC_LOG_PATH: &str = "./AsyncLatencyTest.log";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// The target is not of the form `host:port`.
    #[error("Invalid target {0:?} (expected host:port)")]
    InvalidTarget(String),

    /// A bounded run must issue at least one call.
    #[error("Call count must be at least 1")]
    ZeroCallCount,

    /// The RPC runtime needs at least one worker.
    #[error("RPC thread count must be at least 1")]
    ZeroRpcThreads,
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Greeter endpoint, `host:port`.
    pub target: String,
    /// Latency log location. `None` uses the mode's default path.
    pub log_path: Option<PathBuf>,
    /// Calls to issue. `None` uses [`DEFAULT_CALL_COUNT`].
    pub call_count: Option<u64>,
    /// Worker threads of the RPC runtime.
    pub rpc_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            log_path: None,
            call_count: None,
            rpc_threads: DEFAULT_RPC_THREADS,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `GL_TARGET`: endpoint (default: localhost:50051)
    /// - `GL_LOG_PATH`: latency log path (default: per mode)
    /// - `GL_CALL_COUNT`: calls per bounded run (default: 100000)
    /// - `GL_RPC_THREADS`: RPC runtime workers (default: 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(target) = lookup("GL_TARGET") {
            config.target = target;
        }
        if let Some(path) = lookup("GL_LOG_PATH") {
            config.log_path = Some(PathBuf::from(path));
        }
        if let Some(count) = lookup("GL_CALL_COUNT") {
            config.call_count = Some(parse_var("GL_CALL_COUNT", count)?);
        }
        if let Some(threads) = lookup("GL_RPC_THREADS") {
            config.rpc_threads = parse_var("GL_RPC_THREADS", threads)?;
        }

        Ok(config)
    }

    /// Check the configuration before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.target.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => return Err(ConfigError::InvalidTarget(self.target.clone())),
        }
        if self.call_count == Some(0) {
            return Err(ConfigError::ZeroCallCount);
        }
        if self.rpc_threads == 0 {
            return Err(ConfigError::ZeroRpcThreads);
        }
        Ok(())
    }

    /// Calls a bounded run issues.
    pub fn effective_call_count(&self) -> u64 {
        self.call_count.unwrap_or(DEFAULT_CALL_COUNT)
    }

    /// Log path, falling back to `default` when none is configured.
    pub fn log_path_or<'a>(&'a self, default: &'a str) -> &'a Path {
        self.log_path.as_deref().unwrap_or_else(|| Path::new(default))
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.target, "localhost:50051");
        assert_eq!(config.effective_call_count(), 100_000);
        assert_eq!(config.log_path_or(SYNC_LOG_PATH), Path::new("./LatencyTest.log"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("GL_TARGET", "10.0.0.5:6000"),
            ("GL_LOG_PATH", "/tmp/latency.log"),
            ("GL_CALL_COUNT", "250"),
            ("GL_RPC_THREADS", " 4 "),
        ]))
        .unwrap();

        assert_eq!(config.target, "10.0.0.5:6000");
        assert_eq!(config.log_path_or(ASYNC_LOG_PATH), Path::new("/tmp/latency.log"));
        assert_eq!(config.effective_call_count(), 250);
        assert_eq!(config.rpc_threads, 4);
    }

    #[test]
    fn test_unparseable_value_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[("GL_CALL_COUNT", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "GL_CALL_COUNT",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RuntimeConfig {
            target: "localhost".to_string(),
            ..RuntimeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTarget(_))));

        config.target = DEFAULT_TARGET.to_string();
        config.call_count = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroCallCount));

        config.call_count = Some(1);
        config.rpc_threads = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRpcThreads));
    }
}
