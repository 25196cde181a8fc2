//! The Signal type — the universal event record that crosses every
//! boundary in this runtime (bus, store, engine, harness).

use crate::id::{AgentName, SignalId};
use serde::{Deserialize, Serialize};

/// An immutable event record. Created at emission, never modified,
/// optionally persisted.
///
/// Invariants (enforced by callers, not by the type itself — `Signal` is
/// plain data, not a capability):
///   - `id` is unique within a recording.
///   - `timestamp` is non-decreasing per producer; global ordering is the
///     append order into the bus/store, not the timestamp.
///   - `payload` is treated as immutable once emitted; consumers never
///     mutate it.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    /// Opaque unique id, unique within a recording.
    pub id: SignalId,
    /// Non-empty name, colon-separated segments recommended
    /// (e.g. `"workflow:start"`, `"text:delta"`).
    pub name: String,
    /// Opaque structured payload.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Milliseconds since epoch. This implementation fixes a single
    /// representation rather than allowing a per-recording choice of
    /// string vs. numeric timestamps.
    pub timestamp: u64,
    /// Where this signal came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SignalSource>,
}

/// Provenance of a signal: what caused it and who produced it.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalSource {
    /// The signal id that this signal is a direct consequence of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<SignalId>,
    /// The agent that produced this signal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// The harness/provider that produced this signal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Signal {
    /// Create a new signal with no source and an explicit id/timestamp.
    ///
    /// Most callers should go through an engine-provided constructor (or
    /// a [`crate::harness::SignalSink`], which stamps `source` from the
    /// ambient [`crate::context::Context`] scope) rather than calling this
    /// directly; this constructor is the low-level escape hatch used by
    /// those helpers (and by tests).
    pub fn new(id: SignalId, name: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id,
            name: name.into(),
            payload: serde_json::Value::Null,
            timestamp,
            source: None,
        }
    }

    /// Builder-style payload attachment.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Builder-style source attachment.
    pub fn with_source(mut self, source: SignalSource) -> Self {
        self.source = Some(source);
        self
    }

    /// The ultimate ancestor signal id, following `source.parent` one hop.
    /// Full causality-chain walks require access to the full signal log
    /// (see the engine's causality queries); this only returns the direct
    /// parent, if any.
    pub fn parent_id(&self) -> Option<&SignalId> {
        self.source.as_ref().and_then(|s| s.parent.as_ref())
    }

    /// The agent name attached to this signal's source, if any.
    pub fn source_agent(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.agent.as_deref())
    }
}

impl SignalSource {
    /// Construct a source with only a parent signal id set.
    pub fn from_parent(parent: SignalId) -> Self {
        Self {
            parent: Some(parent),
            agent: None,
            provider: None,
        }
    }

    /// Construct a source scoped to an agent, with an optional parent.
    pub fn from_agent(agent: impl Into<String>, parent: Option<SignalId>) -> Self {
        Self {
            parent,
            agent: Some(agent.into()),
            provider: None,
        }
    }
}

/// Reserved signal names with documented, fixed meaning. `ENGINE_OWNED`
/// names are synthesized exclusively by the engine itself; the `HARNESS_*`
/// names are reserved in the sense that their shape and meaning are fixed,
/// but per the Harness Adapter contract they are emitted by the harness
/// through its sink, not by the engine.
pub mod reserved {
    /// Emitted once at the start of a `Run`.
    pub const WORKFLOW_START: &str = "workflow:start";
    /// Emitted once, as the final engine-emitted signal, at the end of a `Run`.
    pub const WORKFLOW_END: &str = "workflow:end";
    /// Emitted when an agent activation is scheduled and about to begin.
    pub const AGENT_ACTIVATED: &str = "agent:activated";
    /// Emitted when an agent activation finishes successfully.
    pub const AGENT_COMPLETE: &str = "agent:complete";
    /// Emitted when an agent activation's harness fails.
    pub const AGENT_ERROR: &str = "agent:error";
    /// Emitted by a harness as the first signal of every activation.
    pub const HARNESS_START: &str = "harness:start";
    /// Emitted by a harness as the terminal signal of a successful activation.
    pub const HARNESS_END: &str = "harness:end";
    /// Emitted by a harness as the terminal signal of a failed activation.
    pub const HARNESS_ERROR: &str = "harness:error";

    /// All reserved names, for membership checks unconcerned with who the
    /// producer is (e.g. warning a reporter about fixed-meaning names).
    pub const ALL: &[&str] = &[
        WORKFLOW_START,
        WORKFLOW_END,
        AGENT_ACTIVATED,
        AGENT_COMPLETE,
        AGENT_ERROR,
        HARNESS_START,
        HARNESS_END,
        HARNESS_ERROR,
    ];

    /// Names only the engine itself may produce. A harness pushing one of
    /// these through its [`crate::harness::SignalSink`] is a contract
    /// violation; `harness:start`/`harness:end`/`harness:error` are exempt
    /// since the harness is their documented producer.
    pub const ENGINE_OWNED: &[&str] = &[
        WORKFLOW_START,
        WORKFLOW_END,
        AGENT_ACTIVATED,
        AGENT_COMPLETE,
        AGENT_ERROR,
    ];

    /// Whether `name` is reserved at all (engine- or harness-owned).
    pub fn is_reserved(name: &str) -> bool {
        ALL.contains(&name)
    }

    /// Whether `name` may only be emitted by the engine itself, never by a
    /// harness through its sink.
    pub fn is_engine_owned(name: &str) -> bool {
        ENGINE_OWNED.contains(&name)
    }
}

/// Build the conventional `state:<field>:changed` signal name for a state
/// mutation at `field`.
pub fn state_changed_name(field: &str) -> String {
    format!("state:{field}:changed")
}

/// Helper constructors for the handful of engine-owned reserved signals,
/// kept here (next to `Signal`) so the engine crate does not need to hand-
/// assemble payload shapes.
pub struct ReservedSignals;

impl ReservedSignals {
    /// Build a `workflow:start` payload.
    pub fn workflow_start(agents: &[AgentName]) -> serde_json::Value {
        serde_json::json!({
            "agents": agents.iter().map(|a| a.as_str().to_string()).collect::<Vec<_>>(),
        })
    }

    /// Build a `workflow:end` payload.
    pub fn workflow_end(duration_ms: u64, activations: u64) -> serde_json::Value {
        serde_json::json!({
            "durationMs": duration_ms,
            "activations": activations,
        })
    }

    /// Build an `agent:activated` payload.
    pub fn agent_activated(agent: &str, trigger: &str, parent: &SignalId) -> serde_json::Value {
        serde_json::json!({
            "agent": agent,
            "trigger": trigger,
            "parent": parent.as_str(),
        })
    }

    /// Build an `agent:complete` payload.
    pub fn agent_complete(
        agent: &str,
        output: &serde_json::Value,
        duration_ms: u64,
        parent: &SignalId,
    ) -> serde_json::Value {
        serde_json::json!({
            "agent": agent,
            "output": output,
            "durationMs": duration_ms,
            "parent": parent.as_str(),
        })
    }

    /// Build an `agent:error` payload. `kind` is a stable tag for the
    /// failure category (e.g. `"timeout"`); pass `"other"` when the
    /// producer has no more specific kind to report.
    pub fn agent_error(
        agent: &str,
        error: impl std::fmt::Display,
        kind: &str,
        parent: &SignalId,
    ) -> serde_json::Value {
        serde_json::json!({
            "agent": agent,
            "error": error.to_string(),
            "kind": kind,
            "parent": parent.as_str(),
        })
    }
}
