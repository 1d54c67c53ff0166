//! # Call Issuers
//!
//! Two ways of issuing `SayHello`:
//!
//! - [`GreeterClient`] waits for each call on a queue of its own and hands
//!   back the reply.
//! - [`AsyncGreeterClient`] registers every call on one shared queue under a
//!   fresh tag and returns at once; a separate consumer drains the queue.

use std::sync::Arc;

use tracing::{error, trace};

use shared_types::{HelloReply, HelloRequest};

use super::call::{CallRecord, GreeterStub};
use super::completion_queue::{CompletionQueue, QueueEvent};
use crate::adapters::Channel;
use crate::domain::{CallError, CallTag, TagGenerator};

/// Prepare, start and attach one call to a fresh record.
fn issue(stub: &GreeterStub, number: i64, time_start: i64) -> CallRecord {
    let mut call = stub.prepare_async_say_hello(HelloRequest::new(number, time_start));
    call.start_call();
    let mut record = CallRecord::new(number, time_start);
    record.attach(call);
    record
}

/// Issues one call at a time and waits for it.
#[derive(Debug, Clone)]
pub struct GreeterClient {
    stub: GreeterStub,
}

impl GreeterClient {
    /// Client over `channel`.
    pub fn new(channel: Arc<Channel>) -> Self {
        Self {
            stub: GreeterStub::new(channel),
        }
    }

    /// Issue `SayHello` and block until it completes.
    ///
    /// A failed remote call is not an error: it yields an error-marked reply
    /// carrying `number` and `time_start`. Errors mean the completion
    /// machinery misbehaved.
    pub fn say_hello(&self, number: i64, time_start: i64) -> Result<HelloReply, CallError> {
        let queue = CompletionQueue::new();
        queue.register(CallTag::SOLO, issue(&self.stub, number, time_start))?;
        queue.shutdown();

        match queue.next() {
            QueueEvent::Completed(completion) => {
                if completion.tag != CallTag::SOLO {
                    return Err(CallError::TagMismatch {
                        expected: CallTag::SOLO,
                        actual: completion.tag,
                    });
                }
                if !completion.ok {
                    error!(number, "Completion notification failed");
                    return Err(CallError::NotificationFailure {
                        tag: completion.tag,
                    });
                }
                Ok(completion.record.into_reply())
            }
            QueueEvent::Closed => Err(CallError::QueueClosed),
        }
    }
}

/// Issues calls without waiting; completions land on a shared queue.
#[derive(Debug)]
pub struct AsyncGreeterClient {
    stub: GreeterStub,
    queue: Arc<CompletionQueue>,
    tags: TagGenerator,
}

impl AsyncGreeterClient {
    /// Client over `channel` with a fresh completion queue.
    pub fn new(channel: Arc<Channel>) -> Self {
        Self::with_queue(channel, Arc::new(CompletionQueue::new()))
    }

    /// Client over `channel` feeding `queue`.
    pub fn with_queue(channel: Arc<Channel>, queue: Arc<CompletionQueue>) -> Self {
        Self {
            stub: GreeterStub::new(channel),
            queue,
            tags: TagGenerator::new(),
        }
    }

    /// Issue `SayHello` and return its tag without waiting.
    pub fn say_hello(&self, number: i64, time_start: i64) -> Result<CallTag, CallError> {
        let tag = self.tags.next_tag();
        self.queue
            .register(tag, issue(&self.stub, number, time_start))?;
        trace!(%tag, number, "Call issued");
        Ok(tag)
    }

    /// The queue completions are delivered to.
    pub fn completion_queue(&self) -> Arc<CompletionQueue> {
        Arc::clone(&self.queue)
    }

    /// Number of calls issued so far.
    pub fn issued(&self) -> u64 {
        self.tags.issued()
    }

    /// Stop issuing. Outstanding calls still complete onto the queue.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }
}
