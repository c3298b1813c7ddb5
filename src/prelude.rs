//! Convenient imports for annolog.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use annolog::prelude::*;
//!
//! let db = Annolog::open("./notes")?;
//! db.append_annotation(42, Some("Kim"), "콜백 예정")?;
//! ```

// Main entry point
pub use crate::database::{Annolog, AnnologBuilder};

// Configuration
pub use crate::config::EngineConfig;

// Error handling
pub use crate::error::{Error, Result};

// Core types
pub use crate::types::{AnnotationEntry, AnnotationView, AppendResult, EntryId, Origin, ParentId};

// Reports
pub use crate::types::{RepairReport, Reconciled};

// Re-export serde_json for convenience
pub use serde_json::json;
