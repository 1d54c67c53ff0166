//! Outbound Ports (Driven Ports)
//!
//! Dependencies the client core needs from the outside world: something that
//! can carry a `SayHello` call to a peer, and somewhere to persist samples.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::{HelloReply, HelloRequest, RpcStatus};

use crate::domain::{LatencySample, RecordError};

/// Carries one unary call to the remote service (Driven Port).
///
/// Implementations run on the channel's runtime. A call never fails
/// synchronously: every outcome, including connection problems, is reported
/// through the returned status.
#[async_trait]
pub trait GreeterTransport: Send + Sync {
    /// Perform the `SayHello` call.
    async fn say_hello(&self, request: HelloRequest) -> Result<HelloReply, RpcStatus>;

    /// Address or label of the peer, for logs.
    fn target(&self) -> &str;
}

/// Append-only destination for latency samples (Driven Port).
pub trait LatencySink: Send {
    /// Append one sample as one line.
    fn append(&mut self, sample: &LatencySample) -> Result<(), RecordError>;

    /// Append the run summary line.
    fn append_summary(&mut self, elapsed: Duration) -> Result<(), RecordError>;

    /// Push buffered lines to the backing store.
    fn flush(&mut self) -> Result<(), RecordError>;
}

impl<T: LatencySink + ?Sized> LatencySink for Box<T> {
    fn append(&mut self, sample: &LatencySample) -> Result<(), RecordError> {
        (**self).append(sample)
    }

    fn append_summary(&mut self, elapsed: Duration) -> Result<(), RecordError> {
        (**self).append_summary(elapsed)
    }

    fn flush(&mut self) -> Result<(), RecordError> {
        (**self).flush()
    }
}
