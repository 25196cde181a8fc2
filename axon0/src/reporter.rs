//! The Reporter contract: strictly read-only observers of the signal
//! stream, for logging/metrics/tracing integrations.
//!
//! Grounded in `neuron-hooks::Hook`/`HookRegistry`, but deliberately
//! narrowed: a `Hook` can return a `HookAction` that short-circuits or
//! redirects dispatch, while a `Reporter` cannot influence the run in any
//! way. `ReporterRegistry` (in the `axon-reporters` crate) still uses the same
//! ordered-dispatch, swallow-errors idiom as `HookRegistry`.

use crate::pattern::SignalPattern;
use crate::signal::Signal;
use async_trait::async_trait;

/// A read-only observer of signals matching its declared patterns.
///
/// Implementations MUST NOT block the run on slow I/O; a reporter that
/// needs to do expensive work should hand off to a background task and
/// return promptly from `on_signal`.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Human-readable name, used in logging when a reporter errors.
    fn name(&self) -> &str;

    /// Patterns this reporter wants delivered. An empty slice means
    /// "every signal" (equivalent to `["*"]`).
    fn patterns(&self) -> &[SignalPattern];

    /// Called once per matching signal, in emission order. Errors are
    /// logged and swallowed by the registry; they never interrupt the run.
    async fn on_signal(&self, signal: &Signal);
}
