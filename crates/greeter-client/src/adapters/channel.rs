//! # Channel
//!
//! A channel models one connection to one endpoint. It owns the RPC runtime
//! (a small multi-thread tokio runtime that drives transport I/O and call
//! completion in the background) and the transport that calls go through.
//!
//! Channels are created once per run and shared read-only by every stub and
//! every issued call.

use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

use super::tcp::TcpTransport;
use crate::ports::GreeterTransport;

/// Default number of runtime worker threads.
pub const DEFAULT_RPC_THREADS: usize = 2;

/// Channel construction errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The target is not of the form `host:port`.
    #[error("Invalid target address: {0:?} (expected host:port)")]
    InvalidTarget(String),

    /// The runtime could not be started.
    #[error("Failed to start RPC runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Trust mode of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelCredentials {
    /// Plaintext, unauthenticated connection.
    #[default]
    Insecure,
}

/// Channel tuning.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Worker threads of the RPC runtime.
    pub worker_threads: usize,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_RPC_THREADS,
        }
    }
}

/// Connection to one endpoint plus the runtime that drives it.
pub struct Channel {
    target: String,
    transport: Arc<dyn GreeterTransport>,
    runtime: Option<Runtime>,
    handle: Handle,
}

impl Channel {
    /// Create a channel to `target` (`host:port`) with default options.
    ///
    /// No connection is made here; it is established on the first call and
    /// a failure to connect surfaces as an `UNAVAILABLE` status on that call.
    pub fn create(
        target: &str,
        credentials: ChannelCredentials,
    ) -> Result<Arc<Self>, ChannelError> {
        Self::create_with_options(target, credentials, ChannelOptions::default())
    }

    /// Create a channel to `target` with explicit options.
    pub fn create_with_options(
        target: &str,
        credentials: ChannelCredentials,
        options: ChannelOptions,
    ) -> Result<Arc<Self>, ChannelError> {
        validate_target(target)?;
        match credentials {
            ChannelCredentials::Insecure => {
                debug!(peer = target, "Using insecure channel credentials");
            }
        }

        let transport: Arc<dyn GreeterTransport> = Arc::new(TcpTransport::new(target));
        Self::with_transport(transport, options)
    }

    /// Create a channel over an arbitrary transport.
    pub fn with_transport(
        transport: Arc<dyn GreeterTransport>,
        options: ChannelOptions,
    ) -> Result<Arc<Self>, ChannelError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .thread_name("greeter-rpc")
            .enable_all()
            .build()
            .map_err(ChannelError::Runtime)?;
        let handle = runtime.handle().clone();
        let target = transport.target().to_string();

        info!(
            target = %target,
            worker_threads = options.worker_threads.max(1),
            "Channel created"
        );

        Ok(Arc::new(Self {
            target,
            transport,
            runtime: Some(runtime),
            handle,
        }))
    }

    /// Peer address or label.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Handle to the channel's runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// The transport calls go through.
    pub fn transport(&self) -> Arc<dyn GreeterTransport> {
        Arc::clone(&self.transport)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // Background shutdown is safe even when the last reference is
        // released from inside an async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        debug!(peer = %self.target, "Channel closed");
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

fn validate_target(target: &str) -> Result<(), ChannelError> {
    match target.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(ChannelError::InvalidTarget(target.to_string())),
    }
}
