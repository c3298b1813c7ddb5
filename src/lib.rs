//! # annolog
//!
//! Append-only annotation logs for shared business records.
//!
//! Every parent record (a sales lead, a tax-filing business, ...) owns an
//! ordered log of author-attributed, timestamped notes. Concurrent writers
//! never overwrite each other: an append is a version-guarded commit that
//! is retried on conflict, never a read-modify-write of the whole log.
//!
//! ## Quick Start
//!
//! ```ignore
//! use annolog::prelude::*;
//!
//! let db = Annolog::open("./notes")?;
//!
//! // Append
//! let result = db.append_annotation(42, Some("Kim"), "콜백 예정")?;
//!
//! // Read, oldest first
//! let notes = db.get_annotations(42);
//!
//! // Legacy feedback column text, normalized on read
//! db.import_legacy(7, "초기 상담 완료")?;
//!
//! // Merge a backup back in
//! let report = db.repair_log(42, &backup)?;
//!
//! db.close()?;
//! ```
//!
//! ## Components
//!
//! - Schema normalization of every legacy shape (`annolog-wire`)
//! - Per-record CAS store with write-ahead log (`annolog-storage`, `annolog-durability`)
//! - Optimistic append with bounded retry (`annolog-concurrency`)
//! - History reads and backup reconciliation (`annolog-primitives`)

#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use config::EngineConfig;
pub use database::{Annolog, AnnologBuilder, DatabaseMetrics};
pub use error::{Error, Result};

// Re-export types
pub use types::*;

/// Normalize raw annotation data of any historical shape.
///
/// Never fails; unreadable fragments are dropped with a logged
/// `MalformedLegacyDataWarning`.
pub fn normalize(raw: &serde_json::Value) -> Vec<AnnotationEntry> {
    annolog_wire::normalize(raw)
}
