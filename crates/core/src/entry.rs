//! Annotation entries and per-record log snapshots
//!
//! These types define the canonical shape every annotation ends up in,
//! whatever raw representation it was read from.

use crate::log::EntryLog;
use crate::types::{EntryId, ParentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point in time an entry was written (UTC)
pub type Timestamp = DateTime<Utc>;

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Appended through the engine
    Native,
    /// Reconstructed from a pre-engine representation
    Legacy,
}

impl Origin {
    /// Parse the lowercase wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "native" => Some(Origin::Native),
            "legacy" => Some(Origin::Legacy),
            _ => None,
        }
    }
}

/// One author-attributed, timestamped note attached to a parent record
///
/// Entries are immutable once persisted. `content` is never empty and
/// `author` is never empty after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    /// Stable opaque identifier
    pub id: EntryId,
    /// Who wrote the note
    pub author: String,
    /// The note text
    pub content: String,
    /// When the note was written; unknown for some legacy data
    pub created_at: Option<Timestamp>,
    /// Native or reconstructed from legacy data
    pub origin: Origin,
}

impl AnnotationEntry {
    /// Build a native entry with a fresh id
    pub fn native(author: impl Into<String>, content: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: EntryId::new(),
            author: author.into(),
            content: content.into(),
            created_at: Some(at),
            origin: Origin::Native,
        }
    }

    /// `created_at` truncated to whole seconds since the epoch
    pub fn created_second(&self) -> Option<i64> {
        self.created_at.map(|ts| ts.timestamp())
    }

    /// Whether the entry satisfies the persisted-entry invariants
    pub fn is_well_formed(&self) -> bool {
        !self.content.trim().is_empty() && !self.author.trim().is_empty()
    }
}

/// Point-in-time view of one record's annotation log
///
/// `entries` is in append order. `legacy` holds the verbatim text of an
/// un-migrated legacy column, if the record was imported and has not been
/// migrated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    /// Record this log belongs to
    pub parent: ParentId,
    /// Canonical entries in append order
    pub entries: EntryLog,
    /// Number of committed appends (monotonic)
    pub version: u64,
    /// Raw legacy column awaiting migration
    pub legacy: Option<String>,
}

impl LogSnapshot {
    /// The state of a record nobody has written to yet
    pub fn empty(parent: ParentId) -> Self {
        Self {
            parent,
            entries: EntryLog::new(),
            version: 0,
            legacy: None,
        }
    }

    /// Shared empty snapshot
    pub fn empty_shared(parent: ParentId) -> Arc<Self> {
        Arc::new(Self::empty(parent))
    }

    /// True when neither canonical entries nor legacy data exist
    pub fn is_blank(&self) -> bool {
        self.entries.is_empty() && self.legacy.is_none()
    }
}
