//! Annotation Log Integration Suite
//!
//! Exercises the public `Annolog` API end to end: appends under contention,
//! legacy normalization on read, backup repair, and WAL recovery.
//!
//! ## Running Tests
//!
//! ```bash
//! # Everything
//! cargo test --test annotation_log
//!
//! # Concurrency only
//! cargo test --test annotation_log concurrency::
//! ```

use annolog::prelude::*;
use annolog::Timestamp;
use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

// Test modules
pub mod append;
pub mod concurrency;
pub mod durability;
pub mod history;
pub mod repair;
pub mod scenarios;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// In-memory database with no WAL
pub fn create_db() -> Annolog {
    Annolog::ephemeral().unwrap()
}

/// Fixed timestamp, `secs` after 2026-01-20T10:00:00Z
pub fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(1_768_903_200 + secs, 0).unwrap()
}

/// A canonical backup entry as raw JSON
pub fn backup_entry(author: &str, content: &str, secs: i64) -> Value {
    json!({
        "author": author,
        "content": content,
        "created_at": at(secs).to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
