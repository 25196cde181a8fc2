use crate::duration::DurationMs;
use crate::error::HarnessError;
use crate::harness::{Capability, Harness, HarnessOutput, RunContext, SignalSink};
use crate::id::SignalIdAllocator;
use crate::signal::{Signal, SignalSource};
use async_trait::async_trait;
use std::sync::Arc;

/// A harness that always produces the same fixed text content, used
/// throughout the engine's test scenarios (mirrors `Const(...)` in the
/// end-to-end scenarios).
///
/// Emits exactly `harness:start`, `text:complete`, `harness:end` through
/// the sink, then returns an [`HarnessOutput`] carrying the same content.
pub struct ConstHarness {
    name: String,
    content: String,
    ids: SignalIdAllocator,
}

impl ConstHarness {
    /// Create a harness named `name` that always yields `content`.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ids: SignalIdAllocator::new(),
        }
    }
}

#[async_trait]
impl Harness for ConstHarness {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capability {
        Capability {
            streaming: false,
            structured_output: false,
            tools: false,
            resume: false,
        }
    }

    async fn run(
        &self,
        ctx: RunContext,
        sink: Arc<dyn SignalSink>,
    ) -> Result<HarnessOutput, HarnessError> {
        let source = SignalSource::from_agent(ctx.agent.as_str(), Some(ctx.trigger_signal.clone()));

        sink.push(
            Signal::new(self.ids.next(), "harness:start", 0)
                .with_source(source.clone()),
        )
        .await?;

        sink.push(
            Signal::new(self.ids.next(), "text:complete", 0)
                .with_payload(serde_json::json!({ "content": self.content }))
                .with_source(source.clone()),
        )
        .await?;

        sink.push(Signal::new(self.ids.next(), "harness:end", 0).with_source(source)).await?;

        Ok(HarnessOutput::new(
            serde_json::json!({ "content": self.content }),
            DurationMs::ZERO,
        ))
    }
}
