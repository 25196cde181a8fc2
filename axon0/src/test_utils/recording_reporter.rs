use crate::pattern::SignalPattern;
use crate::reporter::Reporter;
use crate::signal::Signal;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A [`Reporter`] that records every matching signal it observes, for
/// test assertions. Records events and takes no other action, scoped to
/// the read-only Reporter contract.
pub struct RecordingReporter {
    patterns: Vec<SignalPattern>,
    seen: Mutex<Vec<Signal>>,
}

impl RecordingReporter {
    /// Create a reporter that records signals matching `patterns` (empty
    /// means "every signal").
    pub fn new(patterns: Vec<SignalPattern>) -> Self {
        Self {
            patterns,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded so far, in observation order.
    pub async fn recorded(&self) -> Vec<Signal> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    fn name(&self) -> &str {
        "recording-reporter"
    }

    fn patterns(&self) -> &[SignalPattern] {
        &self.patterns
    }

    async fn on_signal(&self, signal: &Signal) {
        self.seen.lock().await.push(signal.clone());
    }
}
