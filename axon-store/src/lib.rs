#![deny(missing_docs)]
//! In-memory implementation of [`axon0::SignalStore`].
//!
//! Uses a `HashMap` behind a `tokio::sync::RwLock`, keyed by
//! [`axon0::RecordingId`] rather than a scope/key composite, since a
//! recording is an append-only log rather than an arbitrary key/value
//! space. This is the only `SignalStore` implementation this repo ships;
//! durable backends are out of scope.

use async_trait::async_trait;
use axon0::duration::DurationMs;
use axon0::error::StoreError;
use axon0::id::RecordingId;
use axon0::signal::Signal;
use axon0::store::{
    Checkpoint, ListFilter, LoadSignalsQuery, Recording, RecordingMetadata, RecordingSpec,
    SignalStore,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Monotonic stand-in for wall-clock creation order, since this crate
/// never reads the system clock itself; callers own time. Each `create`
/// call gets the next tick, so `created_at` still sorts
/// recordings in creation order even though it carries no real-world
/// meaning on its own.
fn next_tick(counter: &std::sync::atomic::AtomicU64) -> u64 {
    counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
}

/// In-memory signal store backed by a `HashMap` behind a `RwLock`.
///
/// Suitable for testing, prototyping, and single-process use; recordings
/// do not survive process restart.
pub struct MemoryStore {
    recordings: RwLock<HashMap<String, Recording>>,
    clock: std::sync::atomic::AtomicU64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            recordings: RwLock::new(HashMap::new()),
            clock: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn tags_contain_all(tags: &serde_json::Value, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let Some(present) = tags.as_array() else {
        return false;
    };
    wanted.iter().all(|w| {
        present
            .iter()
            .any(|t| t.as_str().map(|s| s == w).unwrap_or(false))
    })
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn create(&self, id: RecordingId, spec: RecordingSpec) -> Result<(), StoreError> {
        let mut recordings = self.recordings.write().await;
        if recordings.contains_key(id.as_str()) {
            return Err(StoreError::AlreadyExists(id.as_str().to_owned()));
        }
        let created_at = next_tick(&self.clock);
        recordings.insert(
            id.as_str().to_owned(),
            Recording {
                metadata: RecordingMetadata {
                    id,
                    name: spec.name,
                    harness_type: spec.harness_type,
                    created_at,
                    signal_count: 0,
                    duration_ms: None,
                    finalized: false,
                    tags: spec.tags,
                },
                signals: Vec::new(),
                checkpoints: Vec::new(),
            },
        );
        Ok(())
    }

    async fn append(&self, id: &RecordingId, signal: Signal) -> Result<(), StoreError> {
        let mut recordings = self.recordings.write().await;
        let recording = recordings
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))?;
        if recording.metadata.finalized {
            return Err(StoreError::Finalized(id.as_str().to_owned()));
        }
        recording.signals.push(signal);
        recording.metadata.signal_count = recording.signals.len();
        Ok(())
    }

    async fn append_batch(&self, id: &RecordingId, signals: Vec<Signal>) -> Result<(), StoreError> {
        let mut recordings = self.recordings.write().await;
        let recording = recordings
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))?;
        if recording.metadata.finalized {
            return Err(StoreError::Finalized(id.as_str().to_owned()));
        }
        recording.signals.extend(signals);
        recording.metadata.signal_count = recording.signals.len();
        Ok(())
    }

    async fn checkpoint(&self, id: &RecordingId, label: String) -> Result<Checkpoint, StoreError> {
        let mut recordings = self.recordings.write().await;
        let recording = recordings
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))?;
        if recording.metadata.finalized {
            return Err(StoreError::Finalized(id.as_str().to_owned()));
        }
        let timestamp = recording.signals.last().map(|s| s.timestamp).unwrap_or(0);
        let checkpoint = Checkpoint {
            label,
            signal_index: recording.signals.len() as i64 - 1,
            timestamp,
        };
        recording.checkpoints.push(checkpoint.clone());
        Ok(checkpoint)
    }

    async fn get_checkpoints(&self, id: &RecordingId) -> Result<Vec<Checkpoint>, StoreError> {
        let recordings = self.recordings.read().await;
        let recording = recordings
            .get(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))?;
        Ok(recording.checkpoints.clone())
    }

    async fn finalize(&self, id: &RecordingId, duration_ms: Option<DurationMs>) -> Result<(), StoreError> {
        let mut recordings = self.recordings.write().await;
        let recording = recordings
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))?;
        recording.metadata.finalized = true;
        if duration_ms.is_some() {
            recording.metadata.duration_ms = duration_ms;
        }
        Ok(())
    }

    async fn load(&self, id: &RecordingId) -> Result<Recording, StoreError> {
        let recordings = self.recordings.read().await;
        recordings
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))
    }

    async fn load_signals(
        &self,
        id: &RecordingId,
        query: LoadSignalsQuery,
    ) -> Result<Vec<Signal>, StoreError> {
        let recordings = self.recordings.read().await;
        let recording = recordings
            .get(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.as_str().to_owned()))?;

        let from = query.from_index.unwrap_or(0);
        let to = query.to_index.unwrap_or(recording.signals.len());
        let ranged = recording
            .signals
            .get(from..to.min(recording.signals.len()).max(from))
            .unwrap_or(&[]);

        if query.patterns.is_empty() {
            return Ok(ranged.to_vec());
        }
        let matchers: Vec<_> = query
            .patterns
            .iter()
            .map(|p| p.compile())
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(ranged
            .iter()
            .filter(|s| matchers.iter().any(|m: &axon0::pattern::Matcher| m.matches(&s.name)))
            .cloned()
            .collect())
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<RecordingMetadata>, StoreError> {
        let recordings = self.recordings.read().await;
        let mut metadata: Vec<RecordingMetadata> = recordings
            .values()
            .map(|r| r.metadata.clone())
            .filter(|m| {
                filter
                    .harness_type
                    .as_deref()
                    .map(|wanted| m.harness_type.as_deref() == Some(wanted))
                    .unwrap_or(true)
            })
            .filter(|m| tags_contain_all(&m.tags, &filter.tags))
            .collect();
        metadata.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = filter.offset.unwrap_or(0);
        let iter = metadata.into_iter().skip(offset);
        Ok(match filter.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }

    async fn delete(&self, id: &RecordingId) -> Result<(), StoreError> {
        self.recordings.write().await.remove(id.as_str());
        Ok(())
    }

    async fn exists(&self, id: &RecordingId) -> Result<bool, StoreError> {
        Ok(self.recordings.read().await.contains_key(id.as_str()))
    }
}
