//! RecoveryTool: merge a backup back into a live record
//!
//! ## Design: STATELESS FACADE
//!
//! RecoveryTool holds ONLY `Arc<AppendCoordinator>`. It never overwrites a
//! record: the entries a backup contributes are appended through the same
//! version-guarded commit as every other write, and the whole
//! read-reconcile-commit step is retried on `VersionConflict`.

use crate::history::history_of;
use crate::reconcile::reconcile_entries;
use annolog_concurrency::{pending_legacy, AppendCoordinator, CommitPlan};
use annolog_core::error::Result;
use annolog_core::{AnnotationEntry, ParentId};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Outcome of a successful repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// Entries appended from the backup
    pub added_count: usize,
    /// Full merged history at the time of the commit
    pub merged_entries: Vec<AnnotationEntry>,
    /// Record version after the repair
    pub version: u64,
}

/// Administrative repair of annotation logs
#[derive(Debug, Clone)]
pub struct RecoveryTool {
    coordinator: Arc<AppendCoordinator>,
}

impl RecoveryTool {
    /// Create a tool writing through `coordinator`
    pub fn new(coordinator: Arc<AppendCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Append every backup entry the live record is missing
    ///
    /// The backup is normalized first, so any raw shape is accepted. A
    /// pending legacy column is migrated in the same commit. When the
    /// backup adds nothing, nothing is written.
    ///
    /// # Errors
    ///
    /// `AmbiguousMerge` if the live history and the backup disagree on any
    /// key. Nothing is written in that case, not even the clean keys.
    pub fn repair_log(&self, parent: ParentId, backup: &Value) -> Result<RepairReport> {
        let backup = annolog_wire::normalize(backup);

        let ((added_count, merged_entries), version) =
            self.coordinator.commit_with_retry(parent, |snapshot| {
                let current = history_of(snapshot);
                let reconciled = reconcile_entries(&current, &backup)?;
                let added_count = reconciled.added_count();
                let output = (added_count, reconciled.merged);

                if added_count == 0 {
                    return Ok(CommitPlan::Done(output));
                }
                let mut entries = pending_legacy(snapshot);
                entries.extend(reconciled.added);
                Ok(CommitPlan::Commit {
                    entries,
                    clear_legacy: snapshot.legacy.is_some(),
                    output,
                })
            })?;

        if added_count > 0 {
            info!(%parent, added_count, version, "repaired annotation log from backup");
        }
        Ok(RepairReport {
            added_count,
            merged_entries,
            version,
        })
    }
}
