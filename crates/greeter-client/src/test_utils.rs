//! Test utilities for the greeter client.
//!
//! An in-process transport that answers according to an [`EchoScript`]
//! without touching the network, and a helper that wraps it in a channel.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use greeter_client::test_utils::echo_channel;
//! use greeter_client::{EchoScript, GreeterClient};
//!
//! let (channel, transport) = echo_channel(EchoScript::new()).unwrap();
//! let client = GreeterClient::new(channel);
//! let reply = client.say_hello(1, 1000).unwrap();
//! assert_eq!(reply.number, 1);
//! assert_eq!(transport.calls(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use shared_types::{HelloReply, HelloRequest, RpcStatus};

use crate::adapters::{Channel, ChannelError, ChannelOptions, EchoScript};
use crate::ports::GreeterTransport;

/// Scripted in-process transport that counts what it serves.
#[derive(Debug, Default)]
pub struct EchoTransport {
    script: EchoScript,
    calls: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl EchoTransport {
    /// Transport answering per `script`.
    pub fn new(script: EchoScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls currently being served.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of calls served at the same time.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a EchoTransport);

impl<'a> InFlightGuard<'a> {
    fn enter(transport: &'a EchoTransport) -> Self {
        let now = transport.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        transport.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(transport)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GreeterTransport for EchoTransport {
    async fn say_hello(&self, request: HelloRequest) -> Result<HelloReply, RpcStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(self);

        let delay = self.script.delay_for(request.number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.script.should_panic(request.number) {
            panic!("scripted transport panic for call {}", request.number);
        }
        self.script.outcome(&request)
    }

    fn target(&self) -> &str {
        "in-process"
    }
}

/// Channel over a fresh [`EchoTransport`], with the transport for inspection.
pub fn echo_channel(
    script: EchoScript,
) -> Result<(Arc<Channel>, Arc<EchoTransport>), ChannelError> {
    let transport = Arc::new(EchoTransport::new(script));
    let channel = Channel::with_transport(
        Arc::clone(&transport) as Arc<dyn GreeterTransport>,
        ChannelOptions::default(),
    )?;
    Ok((channel, transport))
}
