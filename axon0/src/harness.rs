//! The Harness Adapter contract: how an agent activation actually talks
//! to an underlying model/tool provider and streams signals back.
//!
//! Modeled on `layer0::Operator`/`layer0::Orchestrator` (async-trait,
//! object-safe, push-style output) but reshaped around signal emission
//! rather than turn/effect pairs: a harness does not return a single
//! output value, it pushes zero or more signals through a [`SignalSink`]
//! as it runs and returns only a final [`HarnessOutput`] summary.

use crate::duration::DurationMs;
use crate::error::HarnessError;
use crate::id::{AgentName, SessionId, SignalId};
use crate::signal::Signal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a harness can do. Declared once per harness instance and
/// consulted by the engine before activation (e.g. to decide whether a
/// streaming subscription is meaningful).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capability {
    /// Whether the harness emits incremental signals during the call
    /// rather than only a single result at the end.
    pub streaming: bool,
    /// Whether the harness can produce a structured (non-text) result.
    pub structured_output: bool,
    /// Whether the harness can invoke tools on the caller's behalf.
    pub tools: bool,
    /// Whether a call to this harness can be resumed after a partial
    /// failure (e.g. with a provider-native conversation handle).
    pub resume: bool,
}

/// Per-activation context handed to a harness.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The workflow run's session id.
    pub session_id: SessionId,
    /// The agent being activated.
    pub agent: AgentName,
    /// The signal id whose match triggered this activation; harness
    /// output signals should chain their `source.parent` to this id.
    pub trigger_signal: SignalId,
    /// Expanded prompt/instruction text for this activation, after
    /// template substitution against the current snapshot.
    pub prompt: String,
    /// Cooperative cancellation: a harness SHOULD poll or select on this
    /// and stop promptly when it fires.
    pub cancellation: tokio_util::sync::CancellationToken,
}

/// Terminal summary of a harness invocation, returned once the call is
/// fully done (after any streamed signals have already been pushed
/// through the [`SignalSink`]).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessOutput {
    /// Final structured or text result.
    #[serde(default)]
    pub result: serde_json::Value,
    /// Wall-clock duration of the call.
    pub duration: DurationMs,
}

impl HarnessOutput {
    /// Construct an output carrying only a result value and a duration.
    pub fn new(result: serde_json::Value, duration: DurationMs) -> Self {
        Self { result, duration }
    }
}

/// Push-style delivery of signals produced mid-activation (e.g. streaming
/// tokens, tool-call records). A sink is handed to the harness for the
/// duration of a single invocation; every signal pushed through it is
/// stamped with the activation's ambient [`crate::context::Context`] scope,
/// appended to the run's signal store, and dispatched on the bus before
/// `push` returns.
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Push one signal produced mid-activation.
    async fn push(&self, signal: Signal) -> Result<(), HarnessError>;
}

/// Contract for a harness adapter: given a [`RunContext`] and a
/// [`SignalSink`] to stream through, produce a final [`HarnessOutput`].
///
/// A conforming implementation pushes, in order: exactly one
/// `harness:start`, zero or more content/tool signals, and exactly one of
/// `harness:end` or `harness:error`. Implementations MUST NOT push any of
/// [`crate::signal::reserved::ENGINE_OWNED`] (the `workflow:*`/`agent:*`
/// names) through the sink; those are synthesized by the engine itself.
#[async_trait]
pub trait Harness: Send + Sync {
    /// Human-readable name, used in logging and in `source.provider`.
    fn name(&self) -> &str;

    /// Declared capabilities of this harness.
    fn capabilities(&self) -> Capability;

    /// Run one activation. Returning `Err` causes the engine to emit
    /// `agent:error` and `harness:error`, not a panic or a process abort.
    async fn run(
        &self,
        ctx: RunContext,
        sink: Arc<dyn SignalSink>,
    ) -> Result<HarnessOutput, HarnessError>;
}
