//! The SignalStore contract: append-only recording and replay of signal
//! logs.
//!
//! Grounded in `layer0::StateStore`/`StateReader`'s trait-split and
//! blanket-impl pattern, reshaped from a key/value scope store into an
//! append-only log keyed by [`RecordingId`]. The reference implementation
//! lives in the `axon-store` crate (mirroring `neuron-state-memory`); this
//! crate only defines the contract and its data model.

use crate::duration::DurationMs;
use crate::error::StoreError;
use crate::id::RecordingId;
use crate::pattern::SignalPattern;
use crate::signal::Signal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named point in a recording's signal log, used to bound replay ranges
/// without re-deriving a snapshot from the full history every time.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Caller-chosen label (e.g. `"turn-3"`, `"pre-compaction"`).
    pub label: String,
    /// Index of the last signal present in the recording at the moment
    /// this checkpoint was taken (`currentCount - 1`); `-1` if the
    /// recording had no signals yet.
    pub signal_index: i64,
    /// When the checkpoint was taken, in milliseconds since epoch.
    pub timestamp: u64,
}

/// Caller-supplied fields for [`SignalStore::create`]; everything besides
/// the recording id (passed separately) is optional.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingSpec {
    /// Human-readable label for this recording, independent of its id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Which harness/provider kind produced this recording, for `List`
    /// filtering (e.g. `"anthropic"`, `"mock"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harness_type: Option<String>,
    /// Caller-supplied free-form tags.
    #[serde(default)]
    pub tags: serde_json::Value,
}

impl RecordingSpec {
    /// A bare spec with no name, harness type, or tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style harness type.
    pub fn with_harness_type(mut self, harness_type: impl Into<String>) -> Self {
        self.harness_type = Some(harness_type.into());
        self
    }

    /// Builder-style tags.
    pub fn with_tags(mut self, tags: serde_json::Value) -> Self {
        self.tags = tags;
        self
    }
}

/// Metadata about a recording, independent of its signal contents.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// The recording's id.
    pub id: RecordingId,
    /// Human-readable label, if one was given at [`SignalStore::create`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Harness/provider kind this recording was tagged with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harness_type: Option<String>,
    /// When the recording was created, in milliseconds since epoch.
    pub created_at: u64,
    /// Number of signals appended so far (kept in sync by the store on
    /// every `append`/`append_batch`, not recomputed on read).
    pub signal_count: usize,
    /// Wall-clock duration recorded at [`SignalStore::finalize`], if the
    /// caller supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<DurationMs>,
    /// Whether [`SignalStore::finalize`] has been called; finalized
    /// recordings accept no further appends or checkpoints.
    pub finalized: bool,
    /// Caller-supplied free-form tags (workflow name, run label, etc).
    #[serde(default)]
    pub tags: serde_json::Value,
}

/// A full recording: its metadata, its complete signal log, and any
/// checkpoints taken along the way.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Recording metadata.
    pub metadata: RecordingMetadata,
    /// The complete, ordered signal log.
    pub signals: Vec<Signal>,
    /// Checkpoints taken during recording.
    pub checkpoints: Vec<Checkpoint>,
}

/// Range and pattern bounds for [`SignalStore::load_signals`].
///
/// `from_index`/`to_index` describe a half-open `[from_index, to_index)`
/// range over the recording's signal log; `patterns`, if non-empty, is
/// applied *after* the range is sliced out, keeping only signals whose name
/// matches at least one of the given patterns.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct LoadSignalsQuery {
    /// Inclusive lower bound on signal index; `None` means from the start.
    pub from_index: Option<usize>,
    /// Exclusive upper bound on signal index; `None` means to the end.
    pub to_index: Option<usize>,
    /// Keep only signals matching at least one of these patterns, applied
    /// after the range. Empty means no pattern filtering.
    pub patterns: Vec<SignalPattern>,
}

impl LoadSignalsQuery {
    /// No bounds, no pattern filter: the whole signal log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style inclusive lower bound.
    pub fn with_from_index(mut self, from_index: usize) -> Self {
        self.from_index = Some(from_index);
        self
    }

    /// Builder-style exclusive upper bound.
    pub fn with_to_index(mut self, to_index: usize) -> Self {
        self.to_index = Some(to_index);
        self
    }

    /// Builder-style pattern filter.
    pub fn with_patterns(mut self, patterns: Vec<SignalPattern>) -> Self {
        self.patterns = patterns;
        self
    }
}

/// Filter and pagination parameters for [`SignalStore::list`]. All fields
/// default to "no restriction"; an empty `ListFilter::default()` returns
/// every known recording's metadata, newest first by `created_at`.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Restrict to recordings created with this harness type.
    pub harness_type: Option<String>,
    /// Restrict to recordings whose `tags` is a JSON array containing
    /// every one of these strings.
    pub tags: Vec<String>,
    /// Cap the number of results returned (applied after filtering, before
    /// `offset`... no: applied after `offset`, as a page size).
    pub limit: Option<usize>,
    /// Skip this many matching results before applying `limit`.
    pub offset: Option<usize>,
}

/// Append-only storage and replay for signal recordings.
///
/// Object-safe by design (`dyn SignalStore`), matching `layer0::StateStore`'s
/// trait-object-first approach so the engine can hold a
/// `Arc<dyn SignalStore>` without knowing the concrete backend.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Begin a new recording. Errors if `id` already exists.
    async fn create(&self, id: RecordingId, spec: RecordingSpec) -> Result<(), StoreError>;

    /// Append one signal to an existing, non-finalized recording.
    async fn append(&self, id: &RecordingId, signal: Signal) -> Result<(), StoreError>;

    /// Append many signals atomically with respect to concurrent readers
    /// (a reader never observes a partial batch).
    async fn append_batch(&self, id: &RecordingId, signals: Vec<Signal>) -> Result<(), StoreError>;

    /// Record a checkpoint at the recording's current length.
    async fn checkpoint(&self, id: &RecordingId, label: String) -> Result<Checkpoint, StoreError>;

    /// List checkpoints recorded so far, in the order they were taken.
    async fn get_checkpoints(&self, id: &RecordingId) -> Result<Vec<Checkpoint>, StoreError>;

    /// Mark a recording finalized. Idempotent: finalizing an already
    /// finalized recording is not an error. `duration_ms`, if supplied,
    /// overwrites any previous value.
    async fn finalize(&self, id: &RecordingId, duration_ms: Option<DurationMs>) -> Result<(), StoreError>;

    /// Load a complete recording (metadata, signals, checkpoints).
    async fn load(&self, id: &RecordingId) -> Result<Recording, StoreError>;

    /// Load the signal log bounded by `query`'s `[from_index, to_index)`
    /// range and, if given, filtered to signals matching one of its
    /// patterns (range is applied first, pattern filter second).
    async fn load_signals(
        &self,
        id: &RecordingId,
        query: LoadSignalsQuery,
    ) -> Result<Vec<Signal>, StoreError>;

    /// List metadata for known recordings matching `filter`, sorted newest
    /// first by `created_at`.
    async fn list(&self, filter: ListFilter) -> Result<Vec<RecordingMetadata>, StoreError>;

    /// Permanently remove a recording.
    async fn delete(&self, id: &RecordingId) -> Result<(), StoreError>;

    /// Whether a recording with this id exists.
    async fn exists(&self, id: &RecordingId) -> Result<bool, StoreError>;
}
