//! # Shared Types Crate
//!
//! Message schema for the `Greeter.SayHello` unary call, the status model used
//! to report call outcomes, and the framing used on the wire.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every crate in the workspace speaks these types.
//! - **Echo Contract**: a successful reply echoes the request's `number` and
//!   `time_start`; a failed call carries an error string instead.
//! - **Transport Correlation Is Separate**: the wire `id` belongs to the
//!   transport. Application call tags never travel on the wire.

pub mod messages;
pub mod status;
pub mod wire;

pub use messages::{HelloReply, HelloRequest, RPC_FAILED_MARKER};
pub use status::{RpcStatus, StatusCode};
pub use wire::{decode_line, encode_line, WireError, WireRequest, WireResponse};
