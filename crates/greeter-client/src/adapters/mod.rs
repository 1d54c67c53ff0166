//! Adapters Layer
//!
//! Concrete implementations of the ports plus the channel that owns the RPC
//! runtime:
//! - `channel`: runtime + transport for one endpoint
//! - `tcp`: newline-delimited JSON over one TCP connection
//! - `echo`: echo peer used for loopback measurements and tests
//! - `latency_log`: file and in-memory latency sinks

pub mod channel;
pub mod echo;
pub mod latency_log;
pub mod tcp;

pub use channel::{Channel, ChannelCredentials, ChannelError, ChannelOptions, DEFAULT_RPC_THREADS};
pub use echo::{EchoScript, EchoServer};
pub use latency_log::{summary_line, FileLatencyLog, MemoryLatencyLog};
pub use tcp::TcpTransport;
