//! Domain layer: tags, clock, latency samples and errors. No I/O.

pub mod clock;
pub mod errors;
pub mod latency;
pub mod tag;

pub use clock::RunClock;
pub use errors::{CallError, DrainError, QueueError, RecordError};
pub use latency::{LatencySample, LatencySnapshot, LatencyStats};
pub use tag::{CallTag, TagGenerator};
