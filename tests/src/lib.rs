//! # Greeter Latency Test Suite
//!
//! Cross-crate tests for the client, the measurement modes and the TCP
//! transport.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs       # Single-call and small fixed scenarios
//!     ├── stress.rs          # Many concurrent calls in both modes
//!     └── tcp_end_to_end.rs  # Runs against a real echo server
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p greeter-tests
//!
//! # By category
//! cargo test -p greeter-tests integration::stress::
//!
//! # Benchmarks
//! cargo bench -p greeter-tests
//! ```

pub mod integration;
