//! Core identifier types for the annotation log
//!
//! This module defines the identifiers used throughout the system:
//! - [`ParentId`]: The external business record an annotation log belongs to
//! - [`EntryId`]: Stable opaque identifier of a single annotation entry

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a parent business record (sales lead, tax-filing business, ...)
///
/// The engine never interprets the value. It is the partitioning key of the
/// store: logs of different parents never contend with each other.
///
/// # Examples
///
/// ```
/// use annolog_core::types::ParentId;
///
/// let id = ParentId::new(42);
/// assert_eq!(id.as_u64(), 42);
/// assert_eq!(ParentId::from(42), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentId(u64);

impl ParentId {
    /// Wrap a raw record id
    pub const fn new(id: u64) -> Self {
        ParentId(id)
    }

    /// Raw record id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ParentId {
    fn from(id: u64) -> Self {
        ParentId(id)
    }
}

impl std::fmt::Display for ParentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ParentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ParentId)
    }
}

/// Stable opaque identifier of an annotation entry
///
/// Native entries get a random UUID v4 at append time. Legacy entries that
/// never had an id get a deterministic `legacy-<hash>` id derived from their
/// contents, so decoding the same legacy data twice yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Prefix carried by ids derived from legacy data
    pub const LEGACY_PREFIX: &'static str = "legacy-";

    /// Create a fresh random id for a native entry
    ///
    /// # Examples
    ///
    /// ```
    /// use annolog_core::types::EntryId;
    ///
    /// let a = EntryId::new();
    /// let b = EntryId::new();
    /// assert_ne!(a, b);
    /// assert!(!a.is_derived());
    /// ```
    pub fn new() -> Self {
        EntryId(Uuid::new_v4().to_string())
    }

    /// Id derived from a 64-bit fingerprint of legacy entry contents
    pub fn derived(fingerprint: u64) -> Self {
        EntryId(format!("{}{:016x}", Self::LEGACY_PREFIX, fingerprint))
    }

    /// Adopt an id that was already stored alongside an entry
    pub fn from_stored(id: impl Into<String>) -> Self {
        EntryId(id.into())
    }

    /// Whether this id was synthesized from legacy contents
    pub fn is_derived(&self) -> bool {
        self.0.starts_with(Self::LEGACY_PREFIX)
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
