//! # Greeter Messages
//!
//! The request and reply of the `SayHello` call.

use serde::{Deserialize, Serialize};

/// Error marker substituted into a reply whose call did not succeed.
pub const RPC_FAILED_MARKER: &str = "RPC failed";

/// Request sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelloRequest {
    /// Caller-supplied sequence number, unique within a run.
    pub number: i64,
    /// Nanosecond timestamp captured just before the call was issued.
    pub time_start: i64,
}

impl HelloRequest {
    /// Create a new request.
    #[must_use]
    pub fn new(number: i64, time_start: i64) -> Self {
        Self { number, time_start }
    }
}

/// Reply returned by the service.
///
/// A default reply has zeroed fields and no error, which mirrors an empty
/// reply buffer before the runtime has filled it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelloReply {
    /// Echoed sequence number.
    #[serde(default)]
    pub number: i64,
    /// Echoed start timestamp.
    #[serde(default)]
    pub time_start: i64,
    /// Error string, present only when the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HelloReply {
    /// Build the reply a well-behaved service sends for `request`.
    #[must_use]
    pub fn echo(request: &HelloRequest) -> Self {
        Self {
            number: request.number,
            time_start: request.time_start,
            error: None,
        }
    }

    /// Build an error-marked reply for a call that did not succeed.
    ///
    /// The reply keeps the caller's own sequence number and start time so
    /// that a failed sample is still attributable.
    #[must_use]
    pub fn failed(number: i64, time_start: i64) -> Self {
        Self {
            number,
            time_start,
            error: Some(RPC_FAILED_MARKER.to_string()),
        }
    }

    /// Whether this reply carries an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
