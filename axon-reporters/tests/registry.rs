use async_trait::async_trait;
use axon0::signal::Signal;
use axon0::test_utils::RecordingReporter;
use axon0::SignalPattern;
use axon_bus::SignalBus;
use axon_reporters::ReporterRegistry;
use std::sync::Arc;

fn sig(id: &str, name: &str) -> Signal {
    Signal::new(axon0::id::SignalId::new(id), name, 0)
}

#[tokio::test]
async fn empty_registry_delivers_nothing_to_nobody() {
    let bus = SignalBus::new();
    let registry = ReporterRegistry::new();
    assert!(registry.attached_names().await.is_empty());

    // No reporters attached; emitting is a no-op as far as reporters go.
    bus.emit(sig("s1", "workflow:start")).await;
}

#[tokio::test]
async fn multiple_reporters_each_get_their_own_declared_slice() {
    let bus = SignalBus::new();
    let registry = ReporterRegistry::new();

    let workflow_only = Arc::new(RecordingReporter::new(vec![SignalPattern::new("workflow:*")]));
    let agent_only = Arc::new(RecordingReporter::new(vec![SignalPattern::new("agent:*")]));
    let everything = Arc::new(RecordingReporter::new(vec![]));

    registry.attach(&bus, workflow_only.clone()).await.unwrap();
    registry.attach(&bus, agent_only.clone()).await.unwrap();
    registry.attach(&bus, everything.clone()).await.unwrap();

    bus.emit(sig("s1", "workflow:start")).await;
    bus.emit(sig("s2", "agent:activated")).await;
    bus.emit(sig("s3", "harness:start")).await;

    assert_eq!(workflow_only.recorded().await.len(), 1);
    assert_eq!(agent_only.recorded().await.len(), 1);
    assert_eq!(everything.recorded().await.len(), 3);
}

#[tokio::test]
async fn attached_names_reflects_attach_order() {
    let bus = SignalBus::new();
    let registry = ReporterRegistry::new();

    struct Named(&'static str);
    #[async_trait]
    impl axon0::Reporter for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn patterns(&self) -> &[SignalPattern] {
            &[]
        }
        async fn on_signal(&self, _signal: &Signal) {}
    }

    registry.attach(&bus, Arc::new(Named("metrics"))).await.unwrap();
    registry.attach(&bus, Arc::new(Named("console"))).await.unwrap();

    assert_eq!(registry.attached_names().await, vec!["metrics", "console"]);
}

#[tokio::test]
async fn detach_all_stops_every_attached_reporter() {
    let bus = SignalBus::new();
    let registry = ReporterRegistry::new();
    let a = Arc::new(RecordingReporter::new(vec![]));
    let b = Arc::new(RecordingReporter::new(vec![]));

    registry.attach(&bus, a.clone()).await.unwrap();
    registry.attach(&bus, b.clone()).await.unwrap();

    bus.emit(sig("s1", "x")).await;
    assert_eq!(a.recorded().await.len(), 1);
    assert_eq!(b.recorded().await.len(), 1);

    registry.detach_all(&bus).await;
    assert!(registry.attached_names().await.is_empty());

    bus.emit(sig("s2", "x")).await;
    assert_eq!(a.recorded().await.len(), 1);
    assert_eq!(b.recorded().await.len(), 1);
}

#[tokio::test]
async fn invalid_pattern_on_attach_is_rejected_up_front() {
    let bus = SignalBus::new();
    let registry = ReporterRegistry::new();
    let reporter = Arc::new(RecordingReporter::new(vec![SignalPattern::new("")]));

    let err = registry.attach(&bus, reporter).await.unwrap_err();
    assert!(matches!(err, axon0::error::BusError::InvalidPattern(_)));
}
