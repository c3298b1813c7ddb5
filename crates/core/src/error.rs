//! Error types for the annotation log engine
//!
//! Every layer (storage, durability, coordinator, recovery) reports failures
//! through [`Error`]. The root crate maps it onto its public error type.

use crate::entry::AnnotationEntry;
use crate::types::ParentId;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the engine crates
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error taxonomy
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any storage interaction
    #[error("validation error: {0}")]
    Validation(String),

    /// Conditional commit lost against a concurrent commit
    ///
    /// Nothing was written. Retrying with a fresh version is safe.
    #[error("version conflict on record {parent}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// Record the commit targeted
        parent: ParentId,
        /// Version the caller read
        expected: u64,
        /// Version the store holds
        actual: u64,
    },

    /// Retry budget exhausted under contention
    #[error("concurrent modification of record {parent}: gave up after {attempts} attempts")]
    ConcurrentModification {
        /// Record the append targeted
        parent: ParentId,
        /// Attempts made
        attempts: u32,
    },

    /// Caller deadline passed between attempts
    ///
    /// An earlier attempt may still have committed; callers must check history.
    #[error("append to record {parent} timed out after {elapsed_ms}ms (outcome unknown)")]
    AppendTimeout {
        /// Record the append targeted
        parent: ParentId,
        /// Time spent before giving up
        elapsed_ms: u64,
    },

    /// Reconciliation found entries that cannot be merged automatically
    #[error(transparent)]
    AmbiguousMerge(#[from] AmbiguousMergeError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Durable state failed an integrity check
    #[error("corruption: {0}")]
    Corruption(String),

    /// Invalid engine configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Another open store holds the data directory
    #[error("data directory {} is locked by another open store", .path.display())]
    Locked {
        /// Directory whose lock file is held
        path: PathBuf,
    },

    /// The WAL refused a write after an earlier write or fsync failed
    ///
    /// Persists until the store is reopened, which replays what reached disk.
    #[error("write-ahead log unavailable: {0}; reopen the store")]
    WalPoisoned(String),
}

impl Error {
    /// Whether the failed operation may succeed if simply retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::VersionConflict { .. }
                | Error::ConcurrentModification { .. }
                | Error::AppendTimeout { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Why two entries could not be merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Same author, second and content key, but different content text
    ContentDiverges,
    /// The same native entry id names two entries that disagree
    IdReused,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictReason::ContentDiverges => f.write_str("content diverges under the same dedup key"),
            ConflictReason::IdReused => f.write_str("entry id reused for a different entry"),
        }
    }
}

/// A pair of entries that need operator review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    /// Why the pair conflicts
    pub reason: ConflictReason,
    /// First candidate (canonical order)
    pub left: AnnotationEntry,
    /// Second candidate (canonical order)
    pub right: AnnotationEntry,
}

impl std::fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: [{} by {}: {:?}] vs [{} by {}: {:?}]",
            self.reason,
            self.left.id,
            self.left.author,
            self.left.content,
            self.right.id,
            self.right.author,
            self.right.content
        )
    }
}

/// Reconciliation halted on entries that must not be auto-resolved
///
/// `merged` holds the union of every key that merged cleanly, so an operator
/// can review the conflicts without losing the rest of the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ambiguous merge: {} conflicting pair(s) require operator review", .conflicts.len())]
pub struct AmbiguousMergeError {
    /// Every conflicting pair found
    pub conflicts: Vec<MergeConflict>,
    /// Entries for all unambiguous keys, canonically ordered
    pub merged: Vec<AnnotationEntry>,
}
