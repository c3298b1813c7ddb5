//! Core types for the annotation log engine
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`ParentId`] / [`EntryId`]: identifiers
//! - [`AnnotationEntry`] / [`Origin`]: the canonical entry shape
//! - [`LogSnapshot`]: a point-in-time view of one record's log
//! - [`EntryLog`]: the shared, chunked entry sequence a snapshot holds
//! - [`Error`]: the engine error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod log;
pub mod types;

pub use entry::{AnnotationEntry, LogSnapshot, Origin, Timestamp};
pub use log::EntryLog;
pub use error::{AmbiguousMergeError, ConflictReason, Error, MergeConflict, Result};
pub use types::{EntryId, ParentId};
