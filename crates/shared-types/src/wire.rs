//! # Wire Framing
//!
//! One JSON document per line. The transport assigns every request a
//! connection-local `id` and the peer answers with the same `id`, so replies
//! may arrive in any order.
//!
//! ```text
//! -> {"id":1,"request":{"number":1,"time_start":1000}}
//! <- {"id":1,"code":"ok","reply":{"number":1,"time_start":1000}}
//! <- {"id":2,"code":"unavailable","message":"overloaded","reply":{}}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::{HelloReply, HelloRequest};
use crate::status::{RpcStatus, StatusCode};

/// Errors from encoding or decoding frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// The frame was not valid JSON for the expected type.
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A framed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequest {
    /// Transport correlation id.
    pub id: u64,
    /// Request body.
    pub request: HelloRequest,
}

/// A framed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireResponse {
    /// Transport correlation id copied from the request.
    pub id: u64,
    /// Status code of the call.
    #[serde(default)]
    pub code: StatusCode,
    /// Status detail.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Reply body; meaningful only when `code` is `Ok`.
    #[serde(default)]
    pub reply: HelloReply,
}

impl WireResponse {
    /// Successful response carrying `reply`.
    #[must_use]
    pub fn success(id: u64, reply: HelloReply) -> Self {
        Self {
            id,
            code: StatusCode::Ok,
            message: String::new(),
            reply,
        }
    }

    /// Failed response carrying `status`.
    #[must_use]
    pub fn failure(id: u64, status: RpcStatus) -> Self {
        Self {
            id,
            code: status.code,
            message: status.message,
            reply: HelloReply::default(),
        }
    }

    /// Convert into the call outcome seen by the client.
    pub fn into_outcome(self) -> Result<HelloReply, RpcStatus> {
        if self.code == StatusCode::Ok {
            Ok(self.reply)
        } else {
            Err(RpcStatus::new(self.code, self.message))
        }
    }
}

/// Serialize a frame into a newline-terminated line.
pub fn encode_line<T: Serialize>(frame: &T) -> Result<Vec<u8>, WireError> {
    let mut bytes = serde_json::to_vec(frame)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse one line (with or without its trailing newline) into a frame.
pub fn decode_line<'a, T: Deserialize<'a>>(line: &'a str) -> Result<T, WireError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_line_format() {
        let frame = WireRequest {
            id: 1,
            request: HelloRequest::new(1, 1000),
        };
        let line = encode_line(&frame).unwrap();
        assert_eq!(
            std::str::from_utf8(&line).unwrap(),
            "{\"id\":1,\"request\":{\"number\":1,\"time_start\":1000}}\n"
        );
    }

    #[test]
    fn test_failure_response_into_outcome() {
        let response = WireResponse::failure(9, RpcStatus::unavailable("overloaded"));
        let line = encode_line(&response).unwrap();
        let decoded: WireResponse = decode_line(std::str::from_utf8(&line).unwrap()).unwrap();

        let status = decoded.into_outcome().unwrap_err();
        assert_eq!(status.code, StatusCode::Unavailable);
        assert_eq!(status.message, "overloaded");
    }

    #[test]
    fn test_response_with_missing_code_is_ok() {
        let decoded: WireResponse =
            decode_line(r#"{"id":4,"reply":{"number":4,"time_start":8}}"#).unwrap();
        let reply = decoded.into_outcome().unwrap();
        assert_eq!(reply.number, 4);
        assert_eq!(reply.time_start, 8);
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        let result: Result<WireResponse, _> = decode_line("not json");
        assert!(matches!(result, Err(WireError::Malformed(_))));
    }
}
