//! The reactive engine: schedules agent activations from signal matches,
//! applies state mutations, and terminates per `endWhen`.
//!
//! Grounded in `neuron-orch-kit::OrchestratedRunner`'s depth-first queue
//! loop and `max_followups` safety valve, and in
//! `LocalOrchestrator::dispatch_many`'s `tokio::spawn`-per-activation
//! concurrency, reshaped around signal matching rather than effect
//! execution.

use crate::snapshot::{self, Snapshot};
use crate::workflow::{FixtureMode, RunOptions, Workflow};
use axon0::duration::DurationMs;
use axon0::error::{EngineError, HarnessError};
use axon0::harness::{Harness, RunContext, SignalSink};
use axon0::id::{AgentName, RecordingId, SessionId, SignalIdAllocator};
use axon0::pattern::Matcher;
use axon0::signal::{reserved, ReservedSignals, Signal, SignalSource};
use axon0::store::RecordingSpec;
use axon_bus::SignalBus;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Aggregate result of a completed [`run`].
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Final workflow state.
    pub state: Value,
    /// Every signal observed on the bus, in emission order.
    pub signals: Vec<Signal>,
    /// Summary metrics.
    pub metrics: RunMetrics,
}

/// Summary metrics attached to a [`RunResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunMetrics {
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Total number of agent activations scheduled.
    pub activations: u64,
}

/// Run `workflow` to completion against `options`, creating a fresh
/// [`SignalBus`] and session id.
pub async fn run(workflow: Workflow, options: RunOptions) -> Result<RunResult, EngineError> {
    run_with(
        workflow,
        options,
        Arc::new(SignalBus::new()),
        SessionId::new("session"),
        CancellationToken::new(),
    )
    .await
}

/// Run `workflow` to completion against `options`, using a caller-supplied
/// bus (so reporters can be attached before the run starts), session id,
/// and cancellation token.
pub async fn run_with(
    workflow: Workflow,
    options: RunOptions,
    bus: Arc<SignalBus>,
    session_id: SessionId,
    cancellation: CancellationToken,
) -> Result<RunResult, EngineError> {
    if let FixtureMode::Replay { recording_id } = options.fixture_mode.clone() {
        return replay(workflow, options, recording_id).await;
    }

    let core = EngineCore::new(workflow, options, bus, session_id, cancellation)?;
    let started = std::time::Instant::now();

    let recording_id = if matches!(core.options.fixture_mode, FixtureMode::Record) {
        if let Some(store) = &core.options.store {
            let id = RecordingId::new(format!("run-{}", core.session_id));
            store
                .create(id.clone(), RecordingSpec::new())
                .await
                .map_err(EngineError::Store)?;
            Some(id)
        } else {
            None
        }
    } else {
        None
    };
    *core.recording_id.lock().await = recording_id;

    let start_signal = Signal::new(
        core.ids.next(),
        reserved::WORKFLOW_START,
        0,
    )
    .with_payload(ReservedSignals::workflow_start(&core.workflow.order));
    core.emit(start_signal).await?;

    core.wait_for_completion().await;

    if let Some(err) = core.fatal.lock().await.take() {
        return Err(err);
    }

    let activations = core.activation_count.load(Ordering::SeqCst);
    let duration_ms = started.elapsed().as_millis() as u64;

    let end_signal = Signal::new(
        core.ids.next(),
        reserved::WORKFLOW_END,
        duration_ms,
    )
    .with_payload(ReservedSignals::workflow_end(duration_ms, activations));
    core.emit(end_signal).await?;

    if let Some(store) = &core.options.store {
        if let Some(id) = core.recording_id.lock().await.as_ref() {
            store
                .finalize(id, Some(DurationMs::from_millis(duration_ms)))
                .await
                .map_err(EngineError::Store)?;
        }
    }

    let state = core.snapshot.read().await.state.clone();
    let signals = core.log.lock().await.clone();

    Ok(RunResult {
        state,
        signals,
        metrics: RunMetrics {
            duration_ms,
            activations,
        },
    })
}

async fn replay(
    workflow: Workflow,
    options: RunOptions,
    recording_id: RecordingId,
) -> Result<RunResult, EngineError> {
    let store = options
        .store
        .clone()
        .ok_or_else(|| EngineError::Other(Box::from("replay mode requires a store")))?;
    let signals = store
        .load_signals(&recording_id, axon0::store::LoadSignalsQuery::new())
        .await
        .map_err(EngineError::Store)?;

    let mut snapshot = Snapshot::initial(workflow.initial_state.clone());
    for signal in &signals {
        snapshot::apply(&mut snapshot, signal);
    }

    Ok(RunResult {
        state: snapshot.state,
        signals,
        metrics: RunMetrics {
            duration_ms: 0,
            activations: 0,
        },
    })
}

struct CompiledAgent {
    matchers: Vec<Matcher>,
}

struct EngineCore {
    workflow: Workflow,
    options: RunOptions,
    session_id: SessionId,
    bus: Arc<SignalBus>,
    cancellation: CancellationToken,

    compiled: HashMap<AgentName, CompiledAgent>,
    ids: SignalIdAllocator,
    snapshot: RwLock<Snapshot>,
    log: Mutex<Vec<Signal>>,
    /// Serializes the whole append-derive-schedule-publish pipeline in
    /// [`EngineCore::emit`] across concurrently running activations, so
    /// that two emissions from different in-flight agents can never
    /// interleave their effects on the log/snapshot — emission behaves as
    /// if a single logical scheduler thread dequeued and dispatched signals
    /// one at a time. `dispatch_lock` inside `SignalBus` only serializes the
    /// bus's own fan-out; it does not cover the engine's log append or
    /// snapshot fold that happen before it.
    emit_lock: Mutex<()>,
    in_flight: Mutex<HashSet<AgentName>>,
    activation_count: AtomicU64,
    shutting_down: AtomicBool,
    fatal: Mutex<Option<EngineError>>,
    recording_id: Mutex<Option<RecordingId>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    idle: Notify,
}

impl EngineCore {
    fn new(
        workflow: Workflow,
        options: RunOptions,
        bus: Arc<SignalBus>,
        session_id: SessionId,
        cancellation: CancellationToken,
    ) -> Result<Arc<Self>, EngineError> {
        let mut compiled = HashMap::new();
        for (name, agent) in &workflow.agents {
            let mut matchers = Vec::with_capacity(agent.activate_on.len());
            for pattern in &agent.activate_on {
                matchers.push(pattern.compile().map_err(|e| EngineError::Other(Box::new(e)))?);
            }
            compiled.insert(name.clone(), CompiledAgent { matchers });
        }

        let snapshot = Snapshot::initial(workflow.initial_state.clone());

        Ok(Arc::new(Self {
            workflow,
            options,
            session_id,
            bus,
            cancellation,
            compiled,
            ids: SignalIdAllocator::new(),
            snapshot: RwLock::new(snapshot),
            log: Mutex::new(Vec::new()),
            emit_lock: Mutex::new(()),
            in_flight: Mutex::new(HashSet::new()),
            activation_count: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            fatal: Mutex::new(None),
            recording_id: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            idle: Notify::new(),
        }))
    }

    /// Append `signal` to the log and store, apply it to the snapshot,
    /// schedule any agents it triggers, evaluate `endWhen`, and forward it
    /// to the bus for reporters.
    async fn emit(self: &Arc<Self>, signal: Signal) -> Result<(), EngineError> {
        let _emit_guard = self.emit_lock.lock().await;

        self.log.lock().await.push(signal.clone());

        if let Some(store) = &self.options.store {
            if let Some(id) = self.recording_id.lock().await.as_ref() {
                if let Err(e) = store.append(id, signal.clone()).await {
                    tracing::warn!(error = %e, "signal store append failed");
                }
            }
        }

        {
            let mut snap = self.snapshot.write().await;
            snapshot::apply(&mut snap, &signal);
        }

        if !self.shutting_down.load(Ordering::Acquire) {
            self.schedule_matching(&signal).await?;

            let state = self.snapshot.read().await.state.clone();
            if (self.options.end_when)(&state) {
                self.shutting_down.store(true, Ordering::Release);
                self.idle.notify_waiters();
            }
        }

        self.bus.emit(signal).await;
        Ok(())
    }

    async fn schedule_matching(self: &Arc<Self>, signal: &Signal) -> Result<(), EngineError> {
        let state = self.snapshot.read().await.state.clone();

        for name in &self.workflow.order {
            let agent = &self.workflow.agents[name];
            let compiled = &self.compiled[name];

            if !compiled.matchers.iter().any(|m| m.matches(&signal.name)) {
                continue;
            }
            if let Some(guard) = &agent.when {
                if !guard(&state, signal) {
                    continue;
                }
            }
            {
                let mut in_flight = self.in_flight.lock().await;
                if in_flight.contains(name) {
                    continue;
                }
                in_flight.insert(name.clone());
            }

            let count = self.activation_count.fetch_add(1, Ordering::SeqCst) + 1;
            if count > self.options.max_activations {
                *self.fatal.lock().await = Some(EngineError::ActivationLimitExceeded {
                    limit: self.options.max_activations,
                });
                self.shutting_down.store(true, Ordering::Release);
                self.idle.notify_waiters();
                self.in_flight.lock().await.remove(name);
                return Ok(());
            }

            self.spawn_activation(name.clone(), signal.clone());
        }
        Ok(())
    }

    fn spawn_activation(self: &Arc<Self>, agent_name: AgentName, trigger: Signal) {
        let core = self.clone();
        let handle = tokio::spawn(async move {
            core.run_activation(agent_name.clone(), trigger).await;
            core.in_flight.lock().await.remove(&agent_name);
            core.idle.notify_waiters();
        });
        // best-effort; task-accounting lock is uncontended in practice
        if let Ok(mut tasks) = self.tasks.try_lock() {
            tasks.push(handle);
        }
    }

    async fn run_activation(self: Arc<Self>, agent_name: AgentName, trigger: Signal) {
        let agent = &self.workflow.agents[&agent_name];
        let harness = match self
            .workflow
            .harness_for(agent)
            .or_else(|| self.options.default_harness.clone())
        {
            Some(h) => h,
            None => {
                let err = EngineError::NoHarness(agent_name.as_str().to_owned());
                tracing::warn!(agent = %agent_name, "no harness available for activation");
                self.emit_agent_error(&agent_name, &trigger, err.to_string(), "no_harness")
                    .await;
                return;
            }
        };

        let state = self.snapshot.read().await.state.clone();
        let prompt = crate::template::expand(&agent.prompt, &state, &trigger);

        let activated = Signal::new(
            self.ids.next(),
            reserved::AGENT_ACTIVATED,
            trigger.timestamp,
        )
        .with_payload(ReservedSignals::agent_activated(
            agent_name.as_str(),
            &trigger.name,
            &trigger.id,
        ));
        if let Err(e) = self.emit(activated).await {
            tracing::warn!(error = %e, "failed to emit agent:activated");
            return;
        }

        let child_token = self.cancellation.child_token();
        let timeout_token = child_token.clone();
        let ctx = RunContext {
            session_id: self.session_id.clone(),
            agent: agent_name.clone(),
            trigger_signal: trigger.id.clone(),
            prompt,
            cancellation: child_token,
        };

        let sink: Arc<dyn SignalSink> = Arc::new(ActivationSink { core: self.clone() });

        // Install the ambient propagation scope for the duration of the
        // harness call so nested code the harness invokes (tool handlers,
        // helper futures), and the sink itself, can read
        // {session, agent, trigger} via `axon0::Context::current()` without
        // it being threaded through every call. `RunContext` above already
        // carries the same fields explicitly for the harness itself; the
        // scope exists for code further down the call chain that has no
        // access to `ctx`.
        let scope = axon0::Scope::for_activation(
            self.session_id.clone(),
            agent_name.clone(),
            trigger.id.clone(),
        );
        let activation_timeout = self.options.activation_timeout;
        let start = std::time::Instant::now();
        let result = axon0::Context::scope(scope, async move {
            match activation_timeout {
                Some(timeout) => {
                    match tokio::time::timeout(timeout.to_std(), harness.run(ctx, sink)).await {
                        Ok(r) => r,
                        Err(_elapsed) => {
                            // Issue cancellation on the activation's context;
                            // the harness is contractually required to wind
                            // down promptly, but since the timed-out future
                            // has already been dropped here this always
                            // surfaces as a timeout, not a harness-observed
                            // cancellation.
                            timeout_token.cancel();
                            Err(HarnessError::Timeout)
                        }
                    }
                }
                None => harness.run(ctx, sink).await,
            }
        })
        .await;

        let agent = &self.workflow.agents[&agent_name];
        match result {
            Ok(output) => {
                if let Some(path) = &agent.updates {
                    let value = output
                        .result
                        .get("output")
                        .or_else(|| output.result.get("content"))
                        .cloned()
                        .unwrap_or_else(|| output.result.clone());
                    let changed = Signal::new(
                        self.ids.next(),
                        axon0::signal::state_changed_name(path),
                        trigger.timestamp,
                    )
                    .with_payload(serde_json::json!({ "newValue": value }));
                    if let Err(e) = self.emit(changed).await {
                        tracing::warn!(error = %e, "failed to emit state change signal");
                    }
                }

                let duration = DurationMs::from(start.elapsed());
                let complete = Signal::new(
                    self.ids.next(),
                    reserved::AGENT_COMPLETE,
                    trigger.timestamp,
                )
                .with_payload(ReservedSignals::agent_complete(
                    agent_name.as_str(),
                    &output.result,
                    duration.as_millis(),
                    &trigger.id,
                ));
                if let Err(e) = self.emit(complete).await {
                    tracing::warn!(error = %e, "failed to emit agent:complete");
                }
            }
            Err(err) => {
                let kind = err.kind();
                self.emit_agent_error(&agent_name, &trigger, err.to_string(), kind)
                    .await;
            }
        }
    }

    async fn emit_agent_error(
        &self,
        agent_name: &AgentName,
        trigger: &Signal,
        message: String,
        kind: &str,
    ) {
        let _emit_guard = self.emit_lock.lock().await;

        let signal = Signal::new(self.ids.next(), reserved::AGENT_ERROR, trigger.timestamp)
            .with_payload(ReservedSignals::agent_error(
                agent_name.as_str(),
                &message,
                kind,
                &trigger.id,
            ));
        self.log.lock().await.push(signal.clone());
        if let Some(store) = &self.options.store {
            if let Some(id) = self.recording_id.lock().await.as_ref() {
                if let Err(e) = store.append(id, signal.clone()).await {
                    tracing::warn!(error = %e, "signal store append failed");
                }
            }
        }
        {
            let mut snap = self.snapshot.write().await;
            snapshot::apply(&mut snap, &signal);
        }
        self.bus.emit(signal).await;
    }

    async fn wait_for_completion(self: &Arc<Self>) {
        loop {
            {
                let mut tasks = self.tasks.lock().await;
                tasks.retain(|h| !h.is_finished());
                let drained = tasks.is_empty();
                let in_flight_empty = self.in_flight.lock().await.is_empty();
                if self.shutting_down.load(Ordering::Acquire) && drained && in_flight_empty {
                    return;
                }
            }

            if self.cancellation.is_cancelled() {
                self.shutting_down.store(true, Ordering::Release);
                let grace = self.options.cancellation_grace.to_std();
                let _ = tokio::time::timeout(grace, self.drain_all_tasks()).await;
                return;
            }

            tokio::select! {
                _ = self.idle.notified() => {}
                _ = tokio::time::sleep(Duration::from_millis(5)) => {}
                _ = self.cancellation.cancelled() => {}
            }
        }
    }

    async fn drain_all_tasks(self: &Arc<Self>) {
        loop {
            let finished = {
                let mut tasks = self.tasks.lock().await;
                tasks.retain(|h| !h.is_finished());
                tasks.is_empty()
            };
            if finished {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// A [`SignalSink`] that stamps `source.agent`/`source.parent` from
/// whatever [`axon0::Context`] scope is current at push time, then folds
/// and broadcasts the signal inline before returning — a harness blocks on
/// its own `push` call until the signal has actually been dispatched.
struct ActivationSink {
    core: Arc<EngineCore>,
}

#[async_trait::async_trait]
impl SignalSink for ActivationSink {
    async fn push(&self, mut signal: Signal) -> Result<(), HarnessError> {
        if reserved::is_engine_owned(&signal.name) {
            return Err(HarnessError::Other(Box::from(format!(
                "harness attempted to emit engine-owned signal name {:?}",
                signal.name
            ))));
        }
        let scope = axon0::Context::current();
        let source = signal.source.get_or_insert_with(SignalSource::default);
        if source.agent.is_none() {
            source.agent = scope.agent.as_ref().map(|a| a.as_str().to_owned());
        }
        if source.parent.is_none() {
            source.parent = scope.trigger_signal.clone();
        }
        self.core
            .emit(signal)
            .await
            .map_err(|e| HarnessError::Other(Box::new(e)))
    }
}
