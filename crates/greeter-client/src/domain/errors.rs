//! Error types for the greeter client.
//!
//! Remote failures are not errors at this level: they arrive as an
//! unsuccessful `RpcStatus` on the completed call. The errors below cover
//! local misuse and breaches of the completion-queue contract.

use thiserror::Error;

use super::tag::CallTag;

/// Errors from registering with a completion queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue no longer accepts registrations.
    #[error("Completion queue is shut down")]
    ShutDown,

    /// Another outstanding call already holds this tag.
    #[error("Tag {0} is already outstanding")]
    DuplicateTag(CallTag),

    /// The call record carries no started operation.
    #[error("Call record has no started operation")]
    NotStarted,
}

/// Errors from issuing a call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Registration with the completion queue failed.
    #[error("Registration failed: {0}")]
    Queue(#[from] QueueError),

    /// The queue closed before the call's completion arrived.
    #[error("Completion queue closed before the call completed")]
    QueueClosed,

    /// The queue yielded a tag other than the one registered.
    #[error("Unexpected tag: expected {expected}, got {actual}")]
    TagMismatch { expected: CallTag, actual: CallTag },

    /// The notification layer reported failure for this registration.
    #[error("Completion notification failed for tag {tag}")]
    NotificationFailure { tag: CallTag },
}

impl CallError {
    /// Whether this error means the completion machinery itself is broken,
    /// as opposed to a misuse the caller could avoid.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::QueueClosed | Self::TagMismatch { .. } | Self::NotificationFailure { .. }
        )
    }
}

/// Errors from persisting a latency sample.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The underlying writer failed.
    #[error("Failed to write latency log: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop the completion drain loop.
#[derive(Debug, Error)]
pub enum DrainError {
    /// The notification layer reported failure; the queue is untrustworthy.
    #[error("Completion notification failed for tag {tag}")]
    NotificationFailure { tag: CallTag },

    /// A sample could not be persisted.
    #[error(transparent)]
    Record(#[from] RecordError),
}
