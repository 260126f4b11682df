//! Detection loop orchestration.
//!
//! [`CryMonitor`] wires the sample source, filter, classifier, actuation
//! and status sinks into the acquire → filter → classify → act cycle, and
//! [`MonitorState`] tracks where in that cycle the loop is. The whole
//! thing runs on one thread; see the crate docs for the concurrency
//! model.

pub mod runner;
pub mod state;

pub use runner::{CryMonitor, CycleOutcome};
pub use state::MonitorState;
