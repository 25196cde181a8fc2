use axon0::duration::DurationMs;
use axon0::error::StoreError;
use axon0::id::{RecordingId, SignalId};
use axon0::signal::Signal;
use axon0::store::{ListFilter, LoadSignalsQuery, RecordingSpec, SignalStore};
use axon_store::MemoryStore;
use std::sync::Arc;

fn sig(name: &str, ts: u64) -> Signal {
    Signal::new(SignalId::new(format!("sig-{ts}")), name, ts)
}

#[tokio::test]
async fn create_then_append_then_load() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");

    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    store.append(&id, sig("workflow:start", 0)).await.unwrap();
    store.append(&id, sig("workflow:end", 1)).await.unwrap();

    let recording = store.load(&id).await.unwrap();
    assert_eq!(recording.signals.len(), 2);
    assert_eq!(recording.signals[0].name, "workflow:start");
    assert_eq!(recording.signals[1].name, "workflow:end");
    assert!(!recording.metadata.finalized);
    assert_eq!(recording.metadata.signal_count, 2);
}

#[tokio::test]
async fn create_twice_is_an_error() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();

    let err = store.create(id, RecordingSpec::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

#[tokio::test]
async fn append_to_unknown_recording_fails() {
    let store = MemoryStore::new();
    let id = RecordingId::new("missing");
    let err = store.append(&id, sig("x", 0)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn append_batch_extends_log_in_order() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();

    store
        .append_batch(
            &id,
            vec![sig("a", 0), sig("b", 1), sig("c", 2)],
        )
        .await
        .unwrap();

    let signals = store.load_signals(&id, LoadSignalsQuery::new()).await.unwrap();
    let names: Vec<&str> = signals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let recording = store.load(&id).await.unwrap();
    assert_eq!(recording.metadata.signal_count, 3);
}

#[tokio::test]
async fn checkpoint_captures_current_length() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    store.append(&id, sig("a", 0)).await.unwrap();
    store.append(&id, sig("b", 1)).await.unwrap();

    let checkpoint = store.checkpoint(&id, "turn-1".to_string()).await.unwrap();
    assert_eq!(checkpoint.label, "turn-1");
    assert_eq!(checkpoint.signal_index, 1);

    let checkpoints = store.get_checkpoints(&id).await.unwrap();
    assert_eq!(checkpoints.len(), 1);
    assert_eq!(checkpoints[0].label, "turn-1");
}

#[tokio::test]
async fn checkpoint_before_any_signals_is_negative_one() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-empty");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();

    let checkpoint = store.checkpoint(&id, "start".to_string()).await.unwrap();
    assert_eq!(checkpoint.signal_index, -1);
}

#[tokio::test]
async fn load_signals_bounded_by_index() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    store
        .append_batch(&id, vec![sig("a", 0), sig("b", 1), sig("c", 2)])
        .await
        .unwrap();

    // [from, to) is half-open: to_index=2 excludes index 2 ("c").
    let partial = store
        .load_signals(&id, LoadSignalsQuery::new().with_to_index(2))
        .await
        .unwrap();
    let names: Vec<&str> = partial.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    let from_one = store
        .load_signals(&id, LoadSignalsQuery::new().with_from_index(1))
        .await
        .unwrap();
    let names: Vec<&str> = from_one.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);

    let middle = store
        .load_signals(&id, LoadSignalsQuery::new().with_from_index(1).with_to_index(2))
        .await
        .unwrap();
    let names: Vec<&str> = middle.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["b"]);
}

#[tokio::test]
async fn load_signals_filters_by_pattern_after_range() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    store
        .append_batch(
            &id,
            vec![
                sig("workflow:start", 0),
                sig("agent:activated", 1),
                sig("agent:complete", 2),
                sig("workflow:end", 3),
            ],
        )
        .await
        .unwrap();

    let agents_only = store
        .load_signals(
            &id,
            LoadSignalsQuery::new().with_patterns(vec![axon0::SignalPattern::new("agent:*")]),
        )
        .await
        .unwrap();
    let names: Vec<&str> = agents_only.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["agent:activated", "agent:complete"]);

    // pattern filter applies after the range, so excluding the tail index
    // also excludes "workflow:end" even though it would otherwise match "*".
    let ranged_then_filtered = store
        .load_signals(
            &id,
            LoadSignalsQuery::new()
                .with_to_index(3)
                .with_patterns(vec![axon0::SignalPattern::new("workflow:*")]),
        )
        .await
        .unwrap();
    let names: Vec<&str> = ranged_then_filtered.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["workflow:start"]);
}

#[tokio::test]
async fn finalize_rejects_further_appends_and_is_idempotent() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    store.append(&id, sig("a", 0)).await.unwrap();

    store.finalize(&id, Some(DurationMs::from_millis(42))).await.unwrap();
    store.finalize(&id, None).await.unwrap(); // idempotent, no overwrite

    let err = store.append(&id, sig("b", 1)).await.unwrap_err();
    assert!(matches!(err, StoreError::Finalized(_)));

    let recording = store.load(&id).await.unwrap();
    assert_eq!(recording.signals.len(), 1);
    assert_eq!(recording.metadata.duration_ms, Some(DurationMs::from_millis(42)));
}

#[tokio::test]
async fn delete_removes_recording() {
    let store = MemoryStore::new();
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    assert!(store.exists(&id).await.unwrap());

    store.delete(&id).await.unwrap();
    assert!(!store.exists(&id).await.unwrap());
}

#[tokio::test]
async fn list_returns_all_known_recordings_newest_first() {
    let store = MemoryStore::new();
    store
        .create(RecordingId::new("a"), RecordingSpec::new().with_name("first"))
        .await
        .unwrap();
    store
        .create(RecordingId::new("b"), RecordingSpec::new().with_name("second"))
        .await
        .unwrap();

    let metadata = store.list(ListFilter::default()).await.unwrap();
    let ids: Vec<&str> = metadata.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn list_filters_by_harness_type_and_tags() {
    let store = MemoryStore::new();
    store
        .create(
            RecordingId::new("a"),
            RecordingSpec::new()
                .with_harness_type("anthropic")
                .with_tags(serde_json::json!(["smoke"])),
        )
        .await
        .unwrap();
    store
        .create(
            RecordingId::new("b"),
            RecordingSpec::new()
                .with_harness_type("mock")
                .with_tags(serde_json::json!(["smoke", "regression"])),
        )
        .await
        .unwrap();

    let by_type = store
        .list(ListFilter {
            harness_type: Some("anthropic".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_type.len(), 1);
    assert_eq!(by_type[0].id.as_str(), "a");

    let by_tag = store
        .list(ListFilter {
            tags: vec!["regression".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id.as_str(), "b");
}

#[tokio::test]
async fn list_respects_limit_and_offset() {
    let store = MemoryStore::new();
    for name in ["a", "b", "c"] {
        store
            .create(RecordingId::new(name), RecordingSpec::new())
            .await
            .unwrap();
    }

    let page = store
        .list(ListFilter {
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id.as_str(), "b");
}

#[tokio::test]
async fn usable_as_dyn_signal_store() {
    let store: Arc<dyn SignalStore> = Arc::new(MemoryStore::new());
    let id = RecordingId::new("rec-1");
    store.create(id.clone(), RecordingSpec::new()).await.unwrap();
    store.append(&id, sig("a", 0)).await.unwrap();

    let recording = store.load(&id).await.unwrap();
    assert_eq!(recording.signals.len(), 1);
}

#[tokio::test]
async fn concurrent_appends_to_different_recordings() {
    let store = Arc::new(MemoryStore::new());
    let mut handles = vec![];
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let id = RecordingId::new(format!("rec-{i}"));
            store.create(id.clone(), RecordingSpec::new()).await.unwrap();
            store.append(&id, sig("a", i as u64)).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    for i in 0..10 {
        let id = RecordingId::new(format!("rec-{i}"));
        let recording = store.load(&id).await.unwrap();
        assert_eq!(recording.signals.len(), 1);
    }
}
