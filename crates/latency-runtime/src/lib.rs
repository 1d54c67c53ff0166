//! # Greeter Latency Runtime
//!
//! Library half of the `greeter-latency` executable.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration defaults, environment overrides, validation
//! - `modes/` - The synchronous and asynchronous measurement loops
//! - `launcher` - Builds channel, log and client for one measurement
//!
//! ## Run Sequence
//!
//! 1. Load configuration (env, then CLI flags) and validate it
//! 2. Initialize logging
//! 3. Create the channel and truncate the latency log
//! 4. Run the selected mode on a blocking thread while the main task waits
//!    for Ctrl-C; a second Ctrl-C exits without waiting for hung calls
//! 5. Log the run summary; abort if the completion machinery failed

pub mod container;
pub mod launcher;
pub mod modes;

pub use container::{ConfigError, RuntimeConfig};
pub use launcher::{launch, supervise, LaunchError, Measurement, Supervised};
pub use modes::{run_async, run_sync, CallLimit, Mode, RunError, RunSummary};
