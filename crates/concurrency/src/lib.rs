//! Optimistic concurrency control for annotation appends
//!
//! This crate implements the append contract on top of the version-guarded
//! store:
//! - AppendCoordinator: read version, build entry, conditional commit, retry
//! - RetryPolicy: bounded attempts, jittered exponential backoff, deadline
//! - CommitPlan: generic read-plan-commit loop reused by migration and repair
//! - Legacy migration folded into the first append of an un-migrated record

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod retry;

pub use coordinator::{
    pending_legacy, AppendCoordinator, AppendReceipt, CommitPlan, CoordinatorMetrics,
    MigrationReport,
};
pub use retry::RetryPolicy;

/// Author recorded when a caller supplies none
pub const DEFAULT_AUTHOR: &str = "system";
