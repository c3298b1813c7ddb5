//! Storage layer for the annotation log
//!
//! This crate implements the per-record log store:
//! - AnnotationStore: DashMap of per-record cells, sharded by parent id
//! - Conditional (version-guarded) append as the only mutation path
//! - Lock-free-ish reads: readers clone an `Arc` snapshot and never wait on I/O
//! - Optional write-ahead logging and replay via `annolog-durability`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sharded;

pub use sharded::AnnotationStore;
