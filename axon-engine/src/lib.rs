//! Reactive workflow engine: schedules agent activations from signal
//! matches, derives point-in-time state, and drives a workflow to
//! termination.
//!
//! Sits on top of [`axon0`]'s protocol types and [`axon_bus`]'s pattern
//! router; `axon-store`'s [`axon0::SignalStore`] reference implementation
//! is an optional collaborator supplied via [`workflow::RunOptions`].

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod snapshot;
pub mod template;
pub mod workflow;

pub use engine::{run, run_with, RunMetrics, RunResult};
pub use snapshot::{derive, HarnessLifecycle, Snapshot, StreamAccumulator, ToolCallState, ToolCallStatus};
pub use workflow::{Agent, FixtureMode, Guard, LoggingHint, RunOptions, Workflow};
