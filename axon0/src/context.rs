//! Ambient propagation context: which session/agent/signal is "current"
//! for code running inside an activation, without threading it through
//! every call.
//!
//! Backed by `tokio::task_local!` scoped state, the same mechanism used
//! elsewhere in this codebase for cancellation/tracing spans. The engine
//! installs a [`Scope`] around every harness invocation so a harness (or
//! anything it calls) can read "what agent/session/trigger is this" via
//! [`Context::current`] without an explicit parameter; signals pushed
//! through a [`crate::harness::SignalSink`] during that invocation have
//! their `source` stamped from whatever scope is current at push time.

use crate::id::{AgentName, SessionId, SignalId};
use tokio::task_local;

task_local! {
    static CURRENT: Scope;
}

/// The propagation scope active for the current async task.
#[derive(Debug, Clone)]
pub struct Scope {
    /// The run's session id.
    pub session_id: SessionId,
    /// The agent whose activation this scope belongs to, if any (the
    /// engine's own top-level driver task has no agent scope).
    pub agent: Option<AgentName>,
    /// The signal id that triggered the current activation, used to
    /// populate `source.parent` on signals emitted from within it.
    pub trigger_signal: Option<SignalId>,
}

impl Scope {
    /// A root scope with no agent or trigger signal, used for the
    /// engine's own workflow-level emissions (`workflow:start`, etc).
    pub fn root(session_id: SessionId) -> Self {
        Self {
            session_id,
            agent: None,
            trigger_signal: None,
        }
    }

    /// A scope for a single agent activation.
    pub fn for_activation(
        session_id: SessionId,
        agent: AgentName,
        trigger_signal: SignalId,
    ) -> Self {
        Self {
            session_id,
            agent: Some(agent),
            trigger_signal: Some(trigger_signal),
        }
    }
}

/// Accessor for the ambient propagation scope.
pub struct Context;

impl Context {
    /// Run `f` with `scope` installed as the current scope for the
    /// duration of the returned future.
    pub async fn scope<F, T>(scope: Scope, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        CURRENT.scope(scope, f).await
    }

    /// Read the current scope, cloned. Panics if called outside of a
    /// `Context::scope` future — this is a programming error in an
    /// engine/harness integration, not a runtime condition callers should
    /// need to handle.
    pub fn current() -> Scope {
        CURRENT.with(|s| s.clone())
    }

    /// Read the current scope if one is installed, without panicking.
    pub fn try_current() -> Option<Scope> {
        CURRENT.try_with(|s| s.clone()).ok()
    }
}
