//! Protocol types for the axon reactive signal runtime.
//!
//! This crate defines the wire-level vocabulary shared by every other
//! crate in the workspace: the [`Signal`](signal::Signal) record itself,
//! [`SignalPattern`](pattern::SignalPattern) matching, the error taxonomy,
//! and the three external contracts — [`Harness`](harness::Harness),
//! [`SignalStore`](store::SignalStore), and [`Reporter`](reporter::Reporter)
//! — that other crates implement or consume. It has no executable engine
//! logic of its own.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod duration;
pub mod error;
pub mod harness;
pub mod id;
pub mod pattern;
pub mod reporter;
pub mod signal;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use context::{Context, Scope};
pub use duration::DurationMs;
pub use error::{BusError, EngineError, HarnessError, PatternError, StoreError};
pub use harness::{Capability, Harness, HarnessOutput, RunContext, SignalSink};
pub use id::{AgentName, RecordingId, SessionId, SignalId, SignalIdAllocator};
pub use pattern::{Matcher, SignalPattern};
pub use reporter::Reporter;
pub use signal::{reserved, Signal, SignalSource};
pub use store::{
    Checkpoint, ListFilter, LoadSignalsQuery, Recording, RecordingMetadata, RecordingSpec,
    SignalStore,
};
