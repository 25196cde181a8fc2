//! Typed ID wrappers for signal, session, workflow, and agent identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up signal IDs, session IDs, etc.
/// These are just strings underneath — no UUID enforcement, no format
/// requirement. The protocol doesn't care what your IDs look like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(SignalId, "Unique identifier for a signal.");
typed_id!(SessionId, "Unique identifier for a conversation session.");
typed_id!(WorkflowId, "Unique identifier for a workflow execution.");
typed_id!(AgentName, "Name of a declarative agent within a workflow.");
typed_id!(RecordingId, "Unique identifier for a signal store recording.");

/// Monotonic per-process ID allocator for signals.
///
/// Produces ids of the form `sig-<n>`, which satisfies the "unique within a
/// recording" invariant without requiring a UUID dependency. A driver that
/// needs globally-unique ids across processes can still construct a
/// [`SignalId`] directly — this allocator is a convenience, not the only
/// way to obtain one.
#[derive(Debug, Default)]
pub struct SignalIdAllocator {
    next: std::sync::atomic::AtomicU64,
}

impl SignalIdAllocator {
    /// Create a new allocator starting at zero.
    pub fn new() -> Self {
        Self {
            next: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Allocate the next id.
    pub fn next(&self) -> SignalId {
        let n = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        SignalId::new(format!("sig-{n}"))
    }
}
