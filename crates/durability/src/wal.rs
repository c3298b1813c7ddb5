//! WAL (Write-Ahead Log) record types
//!
//! Every mutation of the annotation store is one record:
//! - Commit: conditional append of one or more entries to a record's log
//! - SeedLegacy: import of an un-migrated legacy feedback column
//!
//! All records carry the parent id, so replay can rebuild each record's log
//! independently. Records for one parent appear in version order.

use annolog_core::{AnnotationEntry, ParentId};
use serde::{Deserialize, Serialize};

/// WAL record types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WalRecord {
    /// Conditional append
    ///
    /// Applies iff the record's version equals `expected_version`. The version
    /// afterwards is `expected_version + entries.len()`.
    Commit {
        /// Record the entries belong to
        parent: ParentId,
        /// Version the commit was checked against
        expected_version: u64,
        /// Entries appended, in order
        entries: Vec<AnnotationEntry>,
        /// Whether the legacy column was migrated (cleared) by this commit
        clear_legacy: bool,
    },

    /// Legacy column import
    ///
    /// Only ever written for a record with no entries and no legacy data.
    SeedLegacy {
        /// Record the column belongs to
        parent: ParentId,
        /// Verbatim column text
        raw: String,
    },
}

impl WalRecord {
    /// Record this WAL record mutates
    pub fn parent(&self) -> ParentId {
        match self {
            WalRecord::Commit { parent, .. } => *parent,
            WalRecord::SeedLegacy { parent, .. } => *parent,
        }
    }

    /// Version of the record after this commit applies
    ///
    /// Returns `None` for legacy seeds, which do not advance the version.
    pub fn resulting_version(&self) -> Option<u64> {
        match self {
            WalRecord::Commit {
                expected_version,
                entries,
                ..
            } => Some(expected_version + entries.len() as u64),
            WalRecord::SeedLegacy { .. } => None,
        }
    }

    /// Check if record is a conditional append
    pub fn is_commit(&self) -> bool {
        matches!(self, WalRecord::Commit { .. })
    }
}
