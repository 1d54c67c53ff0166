//! Ports Layer
//!
//! Traits the core depends on. The issuing API itself is concrete
//! (`GreeterClient`, `AsyncGreeterClient`), so only driven ports live here.

pub mod outbound;

pub use outbound::{GreeterTransport, LatencySink};
