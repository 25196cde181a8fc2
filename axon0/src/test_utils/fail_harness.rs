use crate::error::HarnessError;
use crate::harness::{Capability, Harness, HarnessOutput, RunContext, SignalSink};
use async_trait::async_trait;
use std::sync::Arc;

/// A harness that always fails immediately with a fixed message, used to
/// exercise the engine's `agent:error` path (mirrors `Fail("...")` in the
/// end-to-end scenarios).
pub struct FailHarness {
    name: String,
    message: String,
}

impl FailHarness {
    /// Create a harness named `name` that always fails with `message`.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Harness for FailHarness {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capability {
        Capability::default()
    }

    async fn run(
        &self,
        _ctx: RunContext,
        _sink: Arc<dyn SignalSink>,
    ) -> Result<HarnessOutput, HarnessError> {
        Err(HarnessError::ProviderFailed(self.message.clone().into()))
    }
}
