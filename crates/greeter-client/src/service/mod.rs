//! Service Layer
//!
//! Call issuance, the completion queue, and the consumers that turn
//! completions into latency samples.

pub mod call;
pub mod completion_queue;
pub mod drain;
pub mod issuer;
pub mod recorder;

pub use call::{CallRecord, GreeterStub, PendingCall};
pub use completion_queue::{Completion, CompletionQueue, QueueEvent};
pub use drain::{CompletionDrain, DrainReport};
pub use issuer::{AsyncGreeterClient, GreeterClient};
pub use recorder::LatencyRecorder;
