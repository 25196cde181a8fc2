//! One error enum per protocol boundary, each `#[non_exhaustive]` with a
//! final `Other` catch-all so downstream crates can wrap arbitrary
//! failures without this crate needing to know about them ahead of time.

use thiserror::Error;

/// Errors from compiling or matching a [`crate::pattern::SignalPattern`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// The pattern string was empty.
    #[error("signal pattern cannot be empty")]
    Empty,
    /// The pattern used `*`/`**` in an unsupported position or combination.
    #[error("invalid wildcard in pattern {pattern:?}: {reason}")]
    InvalidWildcard {
        /// The offending pattern.
        pattern: String,
        /// Human-readable explanation.
        reason: String,
    },
    /// Any other pattern compilation failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from [`crate::bus::SignalBus`] operations (defined in the
/// `axon-bus` crate; the error type lives here so every crate speaks the
/// same vocabulary at this boundary).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BusError {
    /// A subscription with this id was not found for unsubscribe.
    #[error("no subscription found with id {0:?}")]
    UnknownSubscription(String),
    /// The pattern on a subscribe call failed to compile.
    #[error("invalid subscription pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    /// A reporter invoked during dispatch returned an error; wrapped here
    /// only when the bus is configured to surface reporter failures
    /// rather than swallow them.
    #[error("reporter {reporter:?} failed: {source}")]
    ReporterFailed {
        /// Name of the failing reporter.
        reporter: String,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Any other bus failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from [`crate::store::SignalStore`] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No recording exists with this id.
    #[error("no recording found with id {0:?}")]
    NotFound(String),
    /// An append or checkpoint was attempted on a finalized recording.
    #[error("recording {0:?} is finalized and accepts no further writes")]
    Finalized(String),
    /// A recording with this id already exists.
    #[error("recording {0:?} already exists")]
    AlreadyExists(String),
    /// The underlying storage medium failed (serialization, I/O, etc).
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Any other store failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from running the reactive engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The workflow definition referenced an agent name that was not
    /// declared.
    #[error("workflow references undeclared agent {0:?}")]
    UndeclaredAgent(String),
    /// No harness was registered for an agent that needed to activate,
    /// and no `defaultHarness` was configured in [`crate::harness::RunOptions`].
    #[error("no harness available for agent {0:?}")]
    NoHarness(String),
    /// A `when` guard expression failed to evaluate.
    #[error("guard expression for agent {agent:?} failed: {reason}")]
    GuardFailed {
        /// Agent whose guard failed.
        agent: String,
        /// Human-readable explanation.
        reason: String,
    },
    /// The configured activation safety bound was exceeded (a likely
    /// feedback loop between agents).
    #[error("activation limit of {limit} exceeded; likely feedback loop")]
    ActivationLimitExceeded {
        /// The configured limit.
        limit: u64,
    },
    /// A signal store operation failed during a run.
    #[error("signal store error: {0}")]
    Store(#[from] StoreError),
    /// A signal bus operation failed during a run.
    #[error("signal bus error: {0}")]
    Bus(#[from] BusError),
    /// A harness invocation failed; see [`crate::harness::HarnessError`]
    /// for the underlying cause.
    #[error("harness error for agent {agent:?}: {source}")]
    Harness {
        /// Agent whose harness invocation failed.
        agent: String,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The run was cancelled cooperatively before `endWhen` was reached.
    #[error("run cancelled")]
    Cancelled,
    /// Any other engine failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a [`crate::harness::Harness`] invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarnessError {
    /// The harness does not support a capability the engine required of it
    /// (e.g. streaming output when none was declared).
    #[error("harness does not support required capability: {0}")]
    UnsupportedCapability(String),
    /// The harness's underlying provider call failed.
    #[error("provider call failed: {0}")]
    ProviderFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The harness was cancelled cooperatively mid-invocation.
    #[error("harness invocation cancelled")]
    Cancelled,
    /// Cancellation completed but the harness did not emit a terminal
    /// signal within the configured grace window.
    #[error("harness invocation timed out")]
    Timeout,
    /// Any other harness failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HarnessError {
    /// Stable, lowercase tag for this error's kind, attached to the
    /// `agent:error` signal's payload as `"kind"` (e.g. `kind=timeout` for
    /// [`HarnessError::Timeout`]).
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::UnsupportedCapability(_) => "unsupported_capability",
            HarnessError::ProviderFailed(_) => "provider_failed",
            HarnessError::Cancelled => "cancelled",
            HarnessError::Timeout => "timeout",
            HarnessError::Other(_) => "other",
        }
    }
}
