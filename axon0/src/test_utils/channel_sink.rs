use crate::error::HarnessError;
use crate::harness::SignalSink;
use crate::signal::Signal;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

/// A [`SignalSink`] backed by an unbounded mpsc channel, so tests (and the
/// engine itself) can drain a harness's pushed signals from the receiving
/// end while the harness runs on its own task.
pub struct ChannelSignalSink {
    tx: UnboundedSender<Signal>,
}

impl ChannelSignalSink {
    /// Wrap a sender half of an unbounded channel.
    pub fn new(tx: UnboundedSender<Signal>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SignalSink for ChannelSignalSink {
    async fn push(&self, signal: Signal) -> Result<(), HarnessError> {
        self.tx
            .send(signal)
            .map_err(|e| HarnessError::Other(Box::new(e)))
    }
}
