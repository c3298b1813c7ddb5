//! HistoryReader: chronological, normalized view of a record's log
//!
//! ## Design: STATELESS FACADE
//!
//! HistoryReader holds ONLY `Arc<AnnotationStore>`. Every call reads one
//! snapshot and derives the history from it, so a read never blocks an
//! append and may trail one that is in flight.
//!
//! ## Ordering
//!
//! Entries are ordered by `created_at` ascending, null timestamps first.
//! Ties (including nulls) keep append order. Un-migrated legacy entries
//! precede every canonical entry in append order.

use annolog_concurrency::pending_legacy;
use annolog_core::{AnnotationEntry, LogSnapshot, ParentId};
use annolog_storage::AnnotationStore;
use serde_json::Value;
use std::sync::Arc;

/// Read-only history access
#[derive(Debug, Clone)]
pub struct HistoryReader {
    store: Arc<AnnotationStore>,
}

impl HistoryReader {
    /// Create a reader over `store`
    pub fn new(store: Arc<AnnotationStore>) -> Self {
        Self { store }
    }

    /// Ordered history of a record; empty if nothing was ever written
    pub fn get_history(&self, parent: ParentId) -> Vec<AnnotationEntry> {
        history_of(&self.store.read(&parent))
    }

    /// Number of entries `get_history` would return
    pub fn count(&self, parent: ParentId) -> usize {
        let snapshot = self.store.read(&parent);
        match snapshot.legacy {
            None => snapshot.entries.len(),
            Some(_) => snapshot.entries.len() + pending_legacy(&snapshot).len(),
        }
    }

    /// History as a canonical JSON array, usable later as a repair backup
    pub fn export_snapshot(&self, parent: ParentId) -> Value {
        annolog_wire::encode_entries(&self.get_history(parent))
    }
}

/// Ordered history of one snapshot
pub fn history_of(snapshot: &LogSnapshot) -> Vec<AnnotationEntry> {
    let mut entries = pending_legacy(snapshot);
    entries.extend(snapshot.entries.iter().cloned());
    order_history(entries)
}

/// Stable sort by `created_at`, nulls first
pub fn order_history(mut entries: Vec<AnnotationEntry>) -> Vec<AnnotationEntry> {
    entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    entries
}
