//! # Call Records
//!
//! Per-call state and the stub that prepares calls.
//!
//! A call goes through three steps:
//!
//! 1. [`GreeterStub::prepare_async_say_hello`] returns a [`PendingCall`] that
//!    has not started yet.
//! 2. [`PendingCall::start_call`] spawns the transport call on the channel's
//!    runtime.
//! 3. The pending call is attached to a [`CallRecord`], which is moved into a
//!    completion queue. The record comes back, completed, with exactly one
//!    completion.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use shared_types::{HelloReply, HelloRequest, RpcStatus};

use crate::adapters::Channel;
use crate::ports::GreeterTransport;

pub(crate) type CallOutcome = Result<HelloReply, RpcStatus>;

enum CallState {
    Prepared,
    InFlight(JoinHandle<CallOutcome>),
}

/// Handle to one unary call, prepared and possibly started.
pub struct PendingCall {
    request: HelloRequest,
    transport: Arc<dyn GreeterTransport>,
    runtime: Handle,
    state: CallState,
}

impl PendingCall {
    fn new(request: HelloRequest, transport: Arc<dyn GreeterTransport>, runtime: Handle) -> Self {
        Self {
            request,
            transport,
            runtime,
            state: CallState::Prepared,
        }
    }

    /// The request this call carries.
    pub fn request(&self) -> &HelloRequest {
        &self.request
    }

    /// Start the call on the channel's runtime. Never blocks.
    ///
    /// Starting a call twice is a no-op.
    pub fn start_call(&mut self) {
        if let CallState::InFlight(_) = self.state {
            warn!(number = self.request.number, "Call already started");
            return;
        }
        let transport = Arc::clone(&self.transport);
        let request = self.request;
        let task = self
            .runtime
            .spawn(async move { transport.say_hello(request).await });
        self.state = CallState::InFlight(task);
    }

    /// Whether [`start_call`](Self::start_call) has run.
    pub fn is_started(&self) -> bool {
        matches!(self.state, CallState::InFlight(_))
    }

    /// The running task and the runtime it runs on, or the call back if it
    /// was never started.
    pub(crate) fn into_task(self) -> Result<(JoinHandle<CallOutcome>, Handle), Self> {
        match self.state {
            CallState::InFlight(task) => Ok((task, self.runtime)),
            CallState::Prepared => Err(self),
        }
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("request", &self.request)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

/// Client stub for the greeter service.
#[derive(Debug, Clone)]
pub struct GreeterStub {
    channel: Arc<Channel>,
}

impl GreeterStub {
    /// Stub issuing calls over `channel`.
    pub fn new(channel: Arc<Channel>) -> Self {
        Self { channel }
    }

    /// Prepare a `SayHello` call without starting it.
    pub fn prepare_async_say_hello(&self, request: HelloRequest) -> PendingCall {
        PendingCall::new(
            request,
            self.channel.transport(),
            self.channel.handle().clone(),
        )
    }
}

/// State of one issued call.
///
/// Owned by the issuer until registration, by the completion queue while the
/// call is outstanding, and by the consumer once its completion is pulled.
#[derive(Debug)]
pub struct CallRecord {
    sequence_number: i64,
    start_time: i64,
    reply: HelloReply,
    status: Option<RpcStatus>,
    pending: Option<PendingCall>,
}

impl CallRecord {
    /// Empty record for a call about to be issued.
    pub fn new(sequence_number: i64, start_time: i64) -> Self {
        Self {
            sequence_number,
            start_time,
            reply: HelloReply::default(),
            status: None,
            pending: None,
        }
    }

    /// Attach the call this record tracks.
    pub fn attach(&mut self, call: PendingCall) {
        if self.pending.is_some() {
            warn!(number = self.sequence_number, "Replacing attached call");
        }
        self.pending = Some(call);
    }

    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Reply buffer. Zeroed until a successful completion fills it.
    pub fn reply(&self) -> &HelloReply {
        &self.reply
    }

    /// Outcome of the call, once completed.
    pub fn status(&self) -> Option<&RpcStatus> {
        self.status.as_ref()
    }

    /// Whether a call is attached and not yet handed to a queue.
    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingCall> {
        self.pending.take()
    }

    /// Store the outcome of the call.
    pub(crate) fn complete(&mut self, outcome: CallOutcome) {
        match outcome {
            Ok(reply) => {
                self.reply = reply;
                self.status = Some(RpcStatus::ok());
            }
            Err(status) => self.status = Some(status),
        }
    }

    /// Whether the call completed with an OK status.
    pub fn succeeded(&self) -> bool {
        self.status.as_ref().is_some_and(RpcStatus::is_ok)
    }

    /// The reply to record: the received reply on success, otherwise an
    /// error-marked reply carrying this record's own number and start time.
    pub fn into_reply(self) -> HelloReply {
        if self.succeeded() {
            self.reply
        } else {
            HelloReply::failed(self.sequence_number, self.start_time)
        }
    }
}
