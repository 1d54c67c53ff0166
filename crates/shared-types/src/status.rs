//! # Call Status
//!
//! Outcome of a remote call, modelled on the canonical RPC status codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status codes used by the greeter service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// The call completed successfully.
    #[default]
    Ok,
    /// The call was cancelled before completing.
    Cancelled,
    /// Unknown error.
    Unknown,
    /// The peer rejected the request as malformed.
    InvalidArgument,
    /// The peer could not be reached or the connection was lost.
    Unavailable,
    /// Internal error in the transport or the peer.
    Internal,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Unavailable => "UNAVAILABLE",
            Self::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// Status of a finished call: a code plus an optional detail message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcStatus {
    /// Status code.
    pub code: StatusCode,
    /// Human-readable detail; empty for `Ok`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl RpcStatus {
    /// Successful status.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// Status with the given code and message.
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Peer unreachable or connection lost.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// Internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    /// Call cancelled before completion.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Cancelled, message)
    }

    /// Whether the call succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for RpcStatus {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_ok() {
        assert!(RpcStatus::default().is_ok());
        assert_eq!(RpcStatus::ok().to_string(), "OK");
    }

    #[test]
    fn test_unavailable_display() {
        let status = RpcStatus::unavailable("connection refused");
        assert!(!status.is_ok());
        assert_eq!(status.to_string(), "UNAVAILABLE: connection refused");
    }

    #[test]
    fn test_code_serializes_snake_case() {
        let json = serde_json::to_string(&StatusCode::InvalidArgument).unwrap();
        assert_eq!(json, r#""invalid_argument""#);
    }
}
