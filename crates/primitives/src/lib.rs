//! Read and repair primitives for the annotation log
//!
//! - HistoryReader: normalized, chronologically ordered history per record
//! - reconcile: deterministic union of two divergent snapshots
//! - RecoveryTool: writes a reconciled backup back through the CAS path
//!
//! Both facades hold only `Arc`s to the store or coordinator. No caches,
//! no locks of their own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod history;
pub mod reconcile;
pub mod repair;

pub use history::{history_of, order_history, HistoryReader};
pub use reconcile::{reconcile, reconcile_entries, Reconciled};
pub use repair::{RecoveryTool, RepairReport};
