//! Declarative workflow and agent definitions, and the `RunOptions`
//! configuration record a driver builds to parameterize one `Run` call.

use axon0::duration::DurationMs;
use axon0::harness::Harness;
use axon0::id::{AgentName, RecordingId};
use axon0::pattern::SignalPattern;
use axon0::signal::Signal;
use axon0::store::SignalStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A guard predicate evaluated against `{state, signal}` before an
/// otherwise-matching activation is scheduled.
pub type Guard = Arc<dyn Fn(&Value, &Signal) -> bool + Send + Sync>;

/// A single declarative agent within a [`Workflow`].
#[non_exhaustive]
pub struct Agent {
    /// The agent's unique name within its workflow.
    pub name: AgentName,
    /// Templated prompt text, expanded against `{state, signal}` at
    /// activation time (see [`crate::template::expand`]).
    pub prompt: String,
    /// Non-empty set of patterns whose match triggers activation.
    pub activate_on: Vec<SignalPattern>,
    /// Patterns this agent may emit, advisory only (not enforced).
    pub emits: Vec<SignalPattern>,
    /// Optional guard; activation additionally requires this to return
    /// `true` when present.
    pub when: Option<Guard>,
    /// Optional dotted path into workflow state where this agent's
    /// output is written on successful completion.
    pub updates: Option<String>,
    /// Optional harness overriding the workflow's default for this agent.
    pub harness: Option<Arc<dyn Harness>>,
}

impl Agent {
    /// Start building an agent named `name` with the given prompt
    /// template and at least one `activate_on` pattern.
    pub fn new(
        name: impl Into<AgentName>,
        prompt: impl Into<String>,
        activate_on: Vec<SignalPattern>,
    ) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            activate_on,
            emits: Vec::new(),
            when: None,
            updates: None,
            harness: None,
        }
    }

    /// Declare the patterns this agent emits (advisory).
    pub fn emits(mut self, patterns: Vec<SignalPattern>) -> Self {
        self.emits = patterns;
        self
    }

    /// Attach a guard predicate.
    pub fn when(mut self, guard: Guard) -> Self {
        self.when = Some(guard);
        self
    }

    /// Set the state path this agent's output is written to.
    pub fn updates(mut self, path: impl Into<String>) -> Self {
        self.updates = Some(path.into());
        self
    }

    /// Override the workflow's default harness for this agent.
    pub fn harness(mut self, harness: Arc<dyn Harness>) -> Self {
        self.harness = Some(harness);
        self
    }
}

/// A named bundle of agents, an initial state, and a termination
/// predicate.
///
/// Agent names are unique within a workflow; the agent set is immutable
/// once constructed via [`Workflow::new`].
#[non_exhaustive]
pub struct Workflow {
    /// Agents keyed by name, in declaration order (iteration order of a
    /// `BTreeMap` is by key, not declaration; `order` preserves the
    /// original registration order used for tie-breaking when multiple
    /// agents match the same signal).
    pub agents: BTreeMap<AgentName, Agent>,
    /// Agent names in the order they were registered.
    pub order: Vec<AgentName>,
    /// The workflow's initial state value.
    pub initial_state: Value,
    /// The workflow's default harness, used by agents with no per-agent
    /// override.
    pub default_harness: Option<Arc<dyn Harness>>,
}

impl Workflow {
    /// Build a workflow from an ordered list of agents and an initial
    /// state. Panics if two agents share a name — this is a construction-
    /// time programming error, not a runtime condition.
    pub fn new(agents: Vec<Agent>, initial_state: Value) -> Self {
        let mut map = BTreeMap::new();
        let mut order = Vec::with_capacity(agents.len());
        for agent in agents {
            let name = agent.name.clone();
            order.push(name.clone());
            if map.insert(name.clone(), agent).is_some() {
                panic!("duplicate agent name in workflow: {name}");
            }
        }
        Self {
            agents: map,
            order,
            initial_state,
            default_harness: None,
        }
    }

    /// Set the workflow-level default harness.
    pub fn with_default_harness(mut self, harness: Arc<dyn Harness>) -> Self {
        self.default_harness = Some(harness);
        self
    }

    /// Resolve which harness agent `name` should be activated with.
    pub fn harness_for(&self, agent: &Agent) -> Option<Arc<dyn Harness>> {
        agent.harness.clone().or_else(|| self.default_harness.clone())
    }
}

/// Fixture mode governing whether a `Run` drives real harness calls or
/// replays a previously recorded signal log.
#[derive(Debug, Clone)]
pub enum FixtureMode {
    /// Normal operation: activations invoke harnesses.
    Live,
    /// Persist every emitted signal to `store` under a fresh recording,
    /// in addition to driving real harness calls.
    Record,
    /// Re-derive state from a previously recorded signal log; no harness
    /// is invoked.
    Replay {
        /// The recording to replay from.
        recording_id: RecordingId,
    },
}

impl Default for FixtureMode {
    fn default() -> Self {
        FixtureMode::Live
    }
}

/// Declarative, serializable configuration for one [`crate::run`] call.
///
/// Every field is optional except what the protocol actually requires,
/// and an instance is constructed fresh by the driver at call time rather
/// than read from a process-global singleton.
#[non_exhaustive]
pub struct RunOptions {
    /// Termination predicate; required.
    pub end_when: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
    /// Used when an agent declares no harness of its own and the workflow
    /// has no default.
    pub default_harness: Option<Arc<dyn Harness>>,
    /// Signal store to persist (and, in replay mode, read from).
    pub store: Option<Arc<dyn SignalStore>>,
    /// Advisory-only logging verbosity hint for attached reporters; the
    /// engine's own `tracing` instrumentation never consults this.
    pub logging: LoggingHint,
    /// Recording/replay mode.
    pub fixture_mode: FixtureMode,
    /// Per-activation timeout; `None` means no timeout.
    pub activation_timeout: Option<DurationMs>,
    /// Grace period granted to an in-flight activation after cancellation
    /// before its remaining signals are discarded.
    pub cancellation_grace: DurationMs,
    /// Safety bound on total activations across the run, guarding against
    /// an agent feedback loop that would otherwise never hit `end_when`.
    pub max_activations: u64,
}

/// Advisory logging verbosity hint carried in [`RunOptions`]. Consulted
/// only by reporters that choose to read it; the engine's own
/// instrumentation is independent of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingHint {
    /// Suppress optional reporter output.
    Quiet,
    /// Default verbosity.
    #[default]
    Normal,
    /// Emit additional reporter detail.
    Verbose,
    /// Reporters should emit nothing at all.
    Off,
}

impl RunOptions {
    /// The default safety bound on total activations.
    pub const DEFAULT_MAX_ACTIVATIONS: u64 = 1000;
    /// The default cancellation grace period.
    pub const DEFAULT_CANCELLATION_GRACE_MS: u64 = 5_000;

    /// Build `RunOptions` with only the required `end_when` predicate set;
    /// every other field takes its documented default.
    pub fn new(end_when: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            end_when: Arc::new(end_when),
            default_harness: None,
            store: None,
            logging: LoggingHint::default(),
            fixture_mode: FixtureMode::default(),
            activation_timeout: None,
            cancellation_grace: DurationMs::from_millis(Self::DEFAULT_CANCELLATION_GRACE_MS),
            max_activations: Self::DEFAULT_MAX_ACTIVATIONS,
        }
    }

    /// Builder-style default harness.
    pub fn with_default_harness(mut self, harness: Arc<dyn Harness>) -> Self {
        self.default_harness = Some(harness);
        self
    }

    /// Builder-style store attachment.
    pub fn with_store(mut self, store: Arc<dyn SignalStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builder-style fixture mode.
    pub fn with_fixture_mode(mut self, mode: FixtureMode) -> Self {
        self.fixture_mode = mode;
        self
    }

    /// Builder-style activation timeout.
    pub fn with_activation_timeout(mut self, timeout: DurationMs) -> Self {
        self.activation_timeout = Some(timeout);
        self
    }

    /// Builder-style activation safety bound.
    pub fn with_max_activations(mut self, max: u64) -> Self {
        self.max_activations = max;
        self
    }
}
