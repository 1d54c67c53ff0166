//! Runtime configuration.

pub mod config;

pub use config::{
    ConfigError, RuntimeConfig, ASYNC_LOG_PATH, DEFAULT_CALL_COUNT, DEFAULT_TARGET, SYNC_LOG_PATH,
};
