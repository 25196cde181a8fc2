//! Pure point-in-time state derivation from a signal log.
//!
//! `derive` is a fold: `derive(initial, signals)` is deterministic and
//! associative over concatenation — `derive(initial, a ++ b)` equals
//! folding `b` onto the snapshot produced by `derive(initial, a)`.

use axon0::signal::Signal;
use serde_json::Value;
use std::collections::BTreeMap;

/// Lifecycle flag for the harness currently (or most recently) in flight
/// within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarnessLifecycle {
    /// No harness call is in flight.
    #[default]
    Idle,
    /// A harness call started and has not yet reached a terminal signal.
    Running,
    /// The most recent harness call ended successfully.
    Ended,
    /// The most recent harness call ended in error.
    Errored,
}

/// A streaming text/thinking accumulator, keyed by `(agent, kind)` in
/// [`Snapshot::streams`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAccumulator {
    /// Accumulated content so far.
    pub content: String,
    /// Whether a `*:complete` signal has finalized this accumulator.
    pub complete: bool,
}

/// In-flight or completed tool call state, tracked in [`Snapshot::tools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallState {
    /// The tool call id.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Input payload, as JSON text (kept as a string to avoid requiring
    /// `Eq` on `serde_json::Value` subtleties across float inputs).
    pub input: String,
    /// Current status.
    pub status: ToolCallStatus,
}

/// Status of a tracked tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallStatus {
    /// `tool:call` seen, no result yet.
    Pending,
    /// `tool:result` seen with a success outcome.
    Complete,
    /// `tool:result` seen with an error outcome.
    Error,
}

/// A point-in-time derived view of a workflow's execution.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Workflow state as of the last processed signal.
    pub state: Value,
    /// Streaming accumulators keyed by `"<agent>:<kind>"` (kind is
    /// `"text"` or `"thinking"`).
    pub streams: BTreeMap<String, StreamAccumulator>,
    /// Tool call state keyed by tool call id.
    pub tools: BTreeMap<String, ToolCallState>,
    /// Current harness lifecycle flag.
    pub harness: HarnessLifecycle,
}

impl Snapshot {
    /// The initial snapshot for `initial_state`, before any signals are
    /// processed.
    pub fn initial(initial_state: Value) -> Self {
        Self {
            state: initial_state,
            streams: BTreeMap::new(),
            tools: BTreeMap::new(),
            harness: HarnessLifecycle::Idle,
        }
    }
}

/// Fold `signals` onto `initial_state`, producing the resulting snapshot.
/// Unknown signal names leave state unchanged but are otherwise ignored
/// (they may still affect stream/tool bookkeeping if they match one of
/// the recognized shapes below).
pub fn derive(initial_state: Value, signals: &[Signal]) -> Snapshot {
    let mut snapshot = Snapshot::initial(initial_state);
    for signal in signals {
        apply(&mut snapshot, signal);
    }
    snapshot
}

/// Fold a single `signal` onto an existing `snapshot` in place. Exposed
/// separately from [`derive`] so the engine can update its live snapshot
/// incrementally, signal by signal, rather than re-folding the whole log
/// on every emission.
pub fn apply(snapshot: &mut Snapshot, signal: &Signal) {
    match signal.name.as_str() {
        "workflow:start" => {
            snapshot.harness = HarnessLifecycle::Idle;
        }
        "harness:start" => {
            snapshot.harness = HarnessLifecycle::Running;
        }
        "harness:end" => {
            snapshot.harness = HarnessLifecycle::Ended;
        }
        "harness:error" => {
            snapshot.harness = HarnessLifecycle::Errored;
        }
        "text:delta" | "thinking:delta" => {
            let kind = signal.name.split(':').next().unwrap_or("text");
            let agent = signal.source_agent().unwrap_or("");
            let key = format!("{agent}:{kind}");
            let delta = signal
                .payload
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or("");
            let entry = snapshot.streams.entry(key).or_default();
            entry.content.push_str(delta);
        }
        "text:complete" | "thinking:complete" => {
            let kind = signal.name.split(':').next().unwrap_or("text");
            let agent = signal.source_agent().unwrap_or("");
            let key = format!("{agent}:{kind}");
            let content = signal
                .payload
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_owned();
            snapshot.streams.insert(
                key,
                StreamAccumulator {
                    content,
                    complete: true,
                },
            );
        }
        "tool:call" => {
            if let (Some(id), Some(name)) = (
                signal.payload.get("id").and_then(Value::as_str),
                signal.payload.get("name").and_then(Value::as_str),
            ) {
                let input = signal
                    .payload
                    .get("input")
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                snapshot.tools.insert(
                    id.to_owned(),
                    ToolCallState {
                        id: id.to_owned(),
                        name: name.to_owned(),
                        input,
                        status: ToolCallStatus::Pending,
                    },
                );
            }
        }
        "tool:result" => {
            if let Some(id) = signal.payload.get("id").and_then(Value::as_str) {
                if let Some(existing) = snapshot.tools.get_mut(id) {
                    let is_error = signal
                        .payload
                        .get("error")
                        .map(|v| !v.is_null())
                        .unwrap_or(false);
                    existing.status = if is_error {
                        ToolCallStatus::Error
                    } else {
                        ToolCallStatus::Complete
                    };
                }
            }
        }
        name if name.starts_with("state:") && name.ends_with(":changed") => {
            if let Some(field) = name
                .strip_prefix("state:")
                .and_then(|rest| rest.strip_suffix(":changed"))
            {
                if let Some(new_value) = signal.payload.get("newValue") {
                    set_path(&mut snapshot.state, field, new_value.clone());
                }
            }
        }
        _ => {}
    }
}

/// Write `value` at dotted `path` within `root`, creating intermediate
/// objects as needed. Used both by the deriver (`state:<field>:changed`)
/// and by the engine when an agent's `updates` path names a nested field.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        if i == segments.len() - 1 {
            if !current.is_object() {
                *current = Value::Object(Default::default());
            }
            current
                .as_object_mut()
                .expect("just ensured object")
                .insert((*segment).to_owned(), value);
            return;
        }
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        current = current
            .as_object_mut()
            .expect("just ensured object")
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Default::default()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon0::id::SignalId;

    fn sig(name: &str, payload: Value) -> Signal {
        Signal::new(SignalId::new("s"), name, 0).with_payload(payload)
    }

    #[test]
    fn state_changed_signal_mutates_state() {
        let initial = serde_json::json!({ "counter": 0 });
        let signals = vec![sig(
            "state:counter:changed",
            serde_json::json!({ "newValue": 5 }),
        )];
        let snapshot = derive(initial, &signals);
        assert_eq!(snapshot.state["counter"], 5);
    }

    #[test]
    fn unknown_signal_leaves_state_unchanged() {
        let initial = serde_json::json!({ "x": 1 });
        let signals = vec![sig("mystery:event", Value::Null)];
        let snapshot = derive(initial, &signals);
        assert_eq!(snapshot.state, serde_json::json!({ "x": 1 }));
    }

    #[test]
    fn associative_over_concatenation() {
        let initial = serde_json::json!({});
        let a = vec![sig(
            "state:x:changed",
            serde_json::json!({ "newValue": 1 }),
        )];
        let b = vec![sig(
            "state:y:changed",
            serde_json::json!({ "newValue": 2 }),
        )];

        let mut combined = a.clone();
        combined.extend(b.clone());
        let whole = derive(initial.clone(), &combined);

        let first = derive(initial, &a);
        let second = derive(first.state.clone(), &b);

        assert_eq!(whole.state, second.state);
    }

    #[test]
    fn text_delta_accumulates_then_complete_replaces() {
        let mut snapshot = Snapshot::initial(Value::Null);
        let mut s1 = sig("text:delta", serde_json::json!({ "content": "he" }));
        s1.source = Some(axon0::signal::SignalSource::from_agent("a", None));
        apply(&mut snapshot, &s1);
        let mut s2 = sig("text:delta", serde_json::json!({ "content": "llo" }));
        s2.source = Some(axon0::signal::SignalSource::from_agent("a", None));
        apply(&mut snapshot, &s2);
        assert_eq!(snapshot.streams["a:text"].content, "hello");

        let mut s3 = sig(
            "text:complete",
            serde_json::json!({ "content": "hello world" }),
        );
        s3.source = Some(axon0::signal::SignalSource::from_agent("a", None));
        apply(&mut snapshot, &s3);
        assert_eq!(snapshot.streams["a:text"].content, "hello world");
        assert!(snapshot.streams["a:text"].complete);
    }
}
