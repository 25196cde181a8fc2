#![deny(missing_docs)]
//! Reporter registry: read-only signal consumers for logging, metrics, and
//! telemetry.
//!
//! An ordered pipeline that dispatches to its members in registration
//! order and swallows member errors rather than letting them interrupt
//! the pipeline, narrowed to the strictly read-only
//! [`Reporter`](axon0::Reporter) contract: a reporter has no `HookAction`
//! equivalent to short-circuit or redirect dispatch, so this registry
//! does not run its own dispatch loop at all. It is a thin bookkeeping layer over
//! [`SignalBus::subscribe`](axon_bus::SignalBus::subscribe): attaching a
//! reporter compiles its declared patterns once and subscribes a handler
//! that re-checks them, so the bus's own subscription-order fan-out is
//! what actually delivers signals in registration order. Detaching a
//! reporter (or the whole registry) just unsubscribes.

use async_trait::async_trait;
use axon0::error::BusError;
use axon0::pattern::Matcher;
use axon0::reporter::Reporter;
use axon0::signal::Signal;
use axon0::SignalPattern;
use axon_bus::{Handler, SignalBus, SubscriptionToken};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Adapts a [`Reporter`] into a bus [`Handler`], re-checking the
/// reporter's own declared patterns before invoking it. A reporter is
/// subscribed to the bus under the catch-all pattern (so a reporter that
/// declares several patterns is invoked at most once per signal, not once
/// per matching pattern); this handler is what actually narrows delivery
/// down to what the reporter asked for.
struct ReporterHandler<R> {
    reporter: Arc<R>,
    matchers: Vec<Matcher>,
}

#[async_trait]
impl<R> Handler for ReporterHandler<R>
where
    R: Reporter + 'static,
{
    async fn handle(&self, signal: &Signal) -> Result<(), BusError> {
        if !self.matchers.is_empty() && !self.matchers.iter().any(|m| m.matches(&signal.name)) {
            return Ok(());
        }
        self.reporter.on_signal(signal).await;
        Ok(())
    }
}

/// A named handle to an attached reporter, returned by
/// [`ReporterRegistry::attach`] so a caller can later
/// [`ReporterRegistry::detach`] that one reporter without tearing down
/// the whole registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReporterHandle(SubscriptionToken);

struct Entry {
    name: String,
    handle: ReporterHandle,
}

/// Attaches [`Reporter`]s to a [`SignalBus`] and keeps track of them so
/// they can be detached together.
///
/// The registry does not own a bus; it is handed one at attach time, so a
/// single registry can manage reporters spread across multiple buses (or,
/// more commonly, a driver builds one registry per run and attaches it to
/// that run's bus before calling [`axon_engine::run_with`](axon_engine).
pub struct ReporterRegistry {
    entries: Mutex<Vec<Entry>>,
}

impl ReporterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe `reporter` to `bus`. Patterns are compiled once here;
    /// an empty pattern list means "every signal", matching
    /// [`Reporter::patterns`]'s documented default.
    ///
    /// Returns a [`ReporterHandle`] for later [`ReporterRegistry::detach`],
    /// or a [`BusError`] if one of the reporter's declared patterns fails
    /// to compile.
    pub async fn attach<R>(&self, bus: &SignalBus, reporter: Arc<R>) -> Result<ReporterHandle, BusError>
    where
        R: Reporter + 'static,
    {
        let name = reporter.name().to_owned();
        let mut matchers = Vec::with_capacity(reporter.patterns().len());
        for pattern in reporter.patterns() {
            matchers.push(pattern.compile()?);
        }
        let handler = Arc::new(ReporterHandler { reporter, matchers });
        let token = bus.subscribe(&SignalPattern::new("*"), handler).await?;
        let handle = ReporterHandle(token);
        self.entries.lock().await.push(Entry {
            name,
            handle,
        });
        Ok(handle)
    }

    /// Unsubscribe one previously attached reporter. Idempotent: returns
    /// `false` if `handle` was already detached (or never known to this
    /// registry).
    pub async fn detach(&self, bus: &SignalBus, handle: ReporterHandle) -> bool {
        let mut entries = self.entries.lock().await;
        if let Some(pos) = entries.iter().position(|e| e.handle == handle) {
            entries.remove(pos);
            drop(entries);
            bus.unsubscribe(handle.0).await
        } else {
            false
        }
    }

    /// Names of every reporter currently attached through this registry,
    /// in attach order.
    pub async fn attached_names(&self) -> Vec<String> {
        self.entries.lock().await.iter().map(|e| e.name.clone()).collect()
    }

    /// Detach every reporter this registry attached.
    pub async fn detach_all(&self, bus: &SignalBus) {
        let entries = std::mem::take(&mut *self.entries.lock().await);
        for entry in entries {
            bus.unsubscribe(entry.handle.0).await;
        }
    }
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
