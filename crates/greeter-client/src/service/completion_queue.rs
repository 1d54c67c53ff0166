//! # Completion Queue
//!
//! Hand-off point between the RPC runtime and application threads.
//!
//! Registering a started call spawns a watcher on the call's runtime. When
//! the call finishes, the watcher stores the outcome in the call record and
//! pushes `(tag, ok, record)` onto an unbounded channel. Application threads
//! pull completions one at a time with [`CompletionQueue::next`], in whatever
//! order the calls finish.
//!
//! ## Shutdown
//!
//! The queue owns the master sender and every watcher holds a clone.
//! [`CompletionQueue::shutdown`] drops the master sender, so the channel
//! reports end-of-stream only after every outstanding call has been
//! delivered. From then on every pull returns [`QueueEvent::Closed`].
//!
//! ## Tags
//!
//! A tag may not be registered while another call holds it. The tag is
//! released just before its completion is pushed, so it is free again by the
//! time the consumer sees the completion.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::call::CallRecord;
use crate::domain::{CallTag, QueueError};

/// One finished call.
#[derive(Debug)]
pub struct Completion {
    /// Tag the call was registered under.
    pub tag: CallTag,
    /// `false` if the notification layer failed and the outcome is unknown.
    pub ok: bool,
    /// The call's record, completed when `ok` is `true`.
    pub record: CallRecord,
}

/// Result of one pull.
#[derive(Debug)]
pub enum QueueEvent {
    /// A call finished.
    Completed(Completion),
    /// The queue is shut down and fully drained.
    Closed,
}

/// Multi-producer completion queue with blocking, single-item pulls.
pub struct CompletionQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Completion>>>,
    receiver: Mutex<mpsc::UnboundedReceiver<Completion>>,
    outstanding: Arc<Mutex<HashSet<CallTag>>>,
    closed: AtomicBool,
    registered: AtomicU64,
    delivered: AtomicU64,
    pulls: AtomicU64,
}

impl CompletionQueue {
    /// Open queue.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            outstanding: Arc::new(Mutex::new(HashSet::new())),
            closed: AtomicBool::new(false),
            registered: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            pulls: AtomicU64::new(0),
        }
    }

    /// Ask for the completion of `record`'s started call under `tag`.
    ///
    /// The record moves into the queue and comes back with the completion.
    /// Fails if the queue is shut down, `tag` is already outstanding, or the
    /// record carries no started call.
    pub fn register(&self, tag: CallTag, mut record: CallRecord) -> Result<(), QueueError> {
        // Held across the whole registration so shutdown cannot interleave.
        let sender_guard = self.sender.lock();
        let sender = sender_guard.as_ref().ok_or(QueueError::ShutDown)?;

        if !self.outstanding.lock().insert(tag) {
            return Err(QueueError::DuplicateTag(tag));
        }

        let pending = record.take_pending().map(|call| call.into_task());
        let (task, runtime) = match pending {
            Some(Ok(started)) => started,
            Some(Err(_)) | None => {
                self.outstanding.lock().remove(&tag);
                return Err(QueueError::NotStarted);
            }
        };

        let sender = sender.clone();
        let outstanding = Arc::clone(&self.outstanding);
        runtime.spawn(async move {
            let ok = match task.await {
                Ok(outcome) => {
                    record.complete(outcome);
                    true
                }
                Err(e) => {
                    error!(%tag, error = %e, "Call task failed; completion outcome unknown");
                    false
                }
            };
            outstanding.lock().remove(&tag);
            if sender.send(Completion { tag, ok, record }).is_err() {
                debug!(%tag, "Completion queue dropped before delivery");
            }
        });

        self.registered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Block until the next completion, or until the queue is shut down and
    /// drained.
    ///
    /// Must not be called from inside an async runtime.
    pub fn next(&self) -> QueueEvent {
        self.pulls.fetch_add(1, Ordering::Relaxed);
        if self.closed.load(Ordering::Acquire) {
            return QueueEvent::Closed;
        }

        let mut receiver = self.receiver.lock();
        match receiver.blocking_recv() {
            Some(completion) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                QueueEvent::Completed(completion)
            }
            None => {
                if !self.closed.swap(true, Ordering::AcqRel) {
                    info!(
                        delivered = self.delivered(),
                        "Completion queue closed"
                    );
                }
                QueueEvent::Closed
            }
        }
    }

    /// Stop accepting registrations. Outstanding calls are still delivered.
    pub fn shutdown(&self) {
        if self.sender.lock().take().is_some() {
            debug!(outstanding = self.outstanding(), "Completion queue shutting down");
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Registered calls whose completion has not been pushed yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding.lock().len()
    }

    /// Successful registrations so far.
    pub fn registered(&self) -> u64 {
        self.registered.load(Ordering::Relaxed)
    }

    /// Completions handed to consumers so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Calls to [`next`](Self::next) so far, including ones that returned
    /// `Closed`.
    pub fn pulls(&self) -> u64 {
        self.pulls.load(Ordering::Relaxed)
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionQueue")
            .field("shut_down", &self.is_shut_down())
            .field("outstanding", &self.outstanding())
            .field("registered", &self.registered())
            .field("delivered", &self.delivered())
            .finish()
    }
}
