//! # Greeter Client
//!
//! Asynchronous unary RPC client for the greeter service, driven by a
//! completion queue, with per-call round-trip latency recording.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Tags, run clock, latency samples, errors
//! - **Ports Layer:** Transport and latency sink traits
//! - **Service Layer:** Call records, completion queue, issuers, drain loop
//! - **Adapters Layer:** Channel, TCP transport, echo peer, log files
//!
//! ## Issuing Model
//!
//! Every call is prepared, started on the channel's runtime, and registered
//! with a [`CompletionQueue`] under a [`CallTag`]. The queue hands the call
//! record back, completed, exactly once. [`GreeterClient`] waits on a private
//! queue per call; [`AsyncGreeterClient`] shares one queue that a
//! [`CompletionDrain`] consumes on another thread.
//!
//! ## Example
//!
//! ```rust,no_run
//! use greeter_client::{Channel, ChannelCredentials, GreeterClient, RunClock};
//!
//! let channel = Channel::create("localhost:50051", ChannelCredentials::Insecure)?;
//! let client = GreeterClient::new(channel);
//! let clock = RunClock::start();
//!
//! let reply = client.say_hello(1, clock.now_ns())?;
//! println!("{} {}", reply.number, reply.time_start);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// In-process transport (EchoTransport, echo_channel)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use domain::{
    CallError, CallTag, DrainError, LatencySample, LatencySnapshot, LatencyStats, QueueError,
    RecordError, RunClock, TagGenerator,
};

pub use ports::{GreeterTransport, LatencySink};

pub use service::{
    AsyncGreeterClient, CallRecord, Completion, CompletionDrain, CompletionQueue, DrainReport,
    GreeterClient, GreeterStub, LatencyRecorder, PendingCall, QueueEvent,
};

pub use adapters::{
    Channel, ChannelCredentials, ChannelError, ChannelOptions, EchoScript, EchoServer,
    FileLatencyLog, MemoryLatencyLog, TcpTransport, DEFAULT_RPC_THREADS,
};

pub use shared_types::{HelloReply, HelloRequest, RpcStatus, StatusCode, RPC_FAILED_MARKER};
