#![deny(missing_docs)]
//! # axon — reactive multi-agent orchestration runtime
//!
//! Single import surface over the workspace: the signal protocol
//! ([`axon0`]), the pattern-addressed pub/sub bus ([`axon_bus`]), the
//! reactive workflow engine ([`axon_engine`]), an in-memory
//! [`axon0::SignalStore`] reference implementation ([`axon_store`]), and a
//! read-only reporter registry ([`axon_reporters`]) — each re-exported
//! behind a feature flag, plus a `prelude` for the happy path.
//!
//! A driver seeds a [`axon_engine::Workflow`] with declarative agents,
//! calls [`axon_engine::run`], and gets back a signal log, a final state,
//! and run metrics. See each member crate's docs for the pieces that make
//! that call work: pattern matching, recording/replay, and point-in-time
//! state derivation.

#[cfg(feature = "core")]
pub use axon0;
#[cfg(feature = "bus")]
pub use axon_bus;
#[cfg(feature = "engine")]
pub use axon_engine;
#[cfg(feature = "reporters")]
pub use axon_reporters;
#[cfg(feature = "store-memory")]
pub use axon_store;

/// Happy-path imports for composing an axon workflow run.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use axon0::{
        AgentName, Capability, Context, Harness, HarnessOutput, RecordingId, Reporter,
        RunContext, Scope, Signal, SignalId, SignalPattern, SignalSink, SignalSource,
        SignalStore,
    };

    #[cfg(feature = "bus")]
    pub use axon_bus::{Handler, ReporterHandler, SignalBus, SubscriptionToken};

    #[cfg(feature = "engine")]
    pub use axon_engine::{
        run, run_with, Agent, FixtureMode, RunOptions, RunResult, Snapshot, Workflow,
    };

    #[cfg(feature = "store-memory")]
    pub use axon_store::MemoryStore;

    #[cfg(feature = "reporters")]
    pub use axon_reporters::ReporterRegistry;
}
