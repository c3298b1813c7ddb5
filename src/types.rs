//! Public types for the annolog API.
//!
//! This module re-exports types from internal crates with a clean public interface.

use serde::Serialize;

// Identifiers and entries
pub use annolog_core::{AnnotationEntry, EntryId, LogSnapshot, Origin, ParentId, Timestamp};

// Merge diagnostics
pub use annolog_core::{AmbiguousMergeError, ConflictReason, MergeConflict};

// Wire shapes and normalization diagnostics
pub use annolog_wire::{AnnotationView, MalformedKind, MalformedLegacyDataWarning, LEGACY_AUTHOR, UNKNOWN_AUTHOR};

// Durability
pub use annolog_durability::{DurabilityMode, RecoveryStats};

// Operation reports
pub use annolog_concurrency::{CoordinatorMetrics, MigrationReport, RetryPolicy};
pub use annolog_primitives::{Reconciled, RepairReport};

/// Response of [`Annolog::append_annotation`](crate::Annolog::append_annotation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResult {
    /// Id of the new entry
    pub entry_id: EntryId,
    /// Record version after the append
    pub version: u64,
}
