//! Persistent, chunked entry sequence
//!
//! An [`EntryLog`] is an immutable list of entries split into shared
//! `Arc<[AnnotationEntry]>` chunks. Appending a batch builds a new log that
//! shares every existing chunk with the old one, so a commit does not copy
//! the record's history.
//!
//! Chunk sizes follow a binary-counter rule: after a push, the last two
//! chunks are merged while the older one is not larger than the newer one.
//! That keeps the chunk count logarithmic in the number of entries and
//! copies each entry a logarithmic number of times over its lifetime.

use crate::entry::AnnotationEntry;
use std::sync::Arc;

/// Immutable, cheaply extendable sequence of entries in append order
#[derive(Clone, Default)]
pub struct EntryLog {
    chunks: Vec<Arc<[AnnotationEntry]>>,
    len: usize,
}

impl EntryLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the log holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of backing chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Entries in append order
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationEntry> + '_ {
        self.chunks.iter().flat_map(|chunk| chunk.iter())
    }

    /// Entry at `index`, if any
    pub fn get(&self, mut index: usize) -> Option<&AnnotationEntry> {
        for chunk in &self.chunks {
            if index < chunk.len() {
                return Some(&chunk[index]);
            }
            index -= chunk.len();
        }
        None
    }

    /// Copy the entries out
    pub fn to_vec(&self) -> Vec<AnnotationEntry> {
        self.iter().cloned().collect()
    }

    /// New log with `batch` appended; `self` is left untouched
    pub fn appended(&self, batch: Vec<AnnotationEntry>) -> Self {
        if batch.is_empty() {
            return self.clone();
        }
        let mut chunks = self.chunks.clone();
        let len = self.len + batch.len();
        chunks.push(Arc::from(batch));

        while chunks.len() >= 2 {
            let newer = chunks[chunks.len() - 1].len();
            let older = chunks[chunks.len() - 2].len();
            if older > newer {
                break;
            }
            let (Some(last), Some(prev)) = (chunks.pop(), chunks.pop()) else {
                break;
            };
            let merged: Vec<AnnotationEntry> = prev.iter().chain(last.iter()).cloned().collect();
            chunks.push(Arc::from(merged));
        }

        Self { chunks, len }
    }
}

impl From<Vec<AnnotationEntry>> for EntryLog {
    fn from(entries: Vec<AnnotationEntry>) -> Self {
        Self::new().appended(entries)
    }
}

impl PartialEq for EntryLog {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for EntryLog {}

impl std::fmt::Debug for EntryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
