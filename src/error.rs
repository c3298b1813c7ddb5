//! Unified error types for annolog.
//!
//! This module provides a clean error type that wraps internal errors
//! and presents a consistent interface to users.

use crate::types::{AmbiguousMergeError, ParentId};
use std::path::PathBuf;
use thiserror::Error;

/// All annolog errors.
///
/// This is the canonical error type for all annolog operations.
/// It provides a clean, stable interface that hides internal error details.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before touching storage (empty content, bad import)
    #[error("validation error: {0}")]
    Validation(String),

    /// Retry budget exhausted under contention; nothing was written
    #[error("concurrent modification of record {parent} after {attempts} attempts")]
    ConcurrentModification {
        /// Record the append targeted
        parent: ParentId,
        /// Attempts made
        attempts: u32,
    },

    /// Caller deadline passed; an earlier attempt may still have committed
    #[error("append to record {parent} timed out after {elapsed_ms}ms, outcome unknown")]
    Timeout {
        /// Record the append targeted
        parent: ParentId,
        /// Time spent
        elapsed_ms: u64,
    },

    /// Snapshots disagree in a way that needs operator review
    #[error(transparent)]
    AmbiguousMerge(AmbiguousMergeError),

    /// Version conflict surfaced without a retry loop
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error (corrupt WAL and the like)
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The data directory is held by another open database
    #[error("data directory {} is locked by another open database", .0.display())]
    Locked(PathBuf),
}

/// Result type for annolog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable error code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "ValidationError",
            Error::ConcurrentModification { .. } => "ConcurrentModificationError",
            Error::Timeout { .. } => "AppendTimeoutError",
            Error::AmbiguousMerge(_) => "AmbiguousMergeError",
            Error::Conflict(_) => "VersionConflictError",
            Error::Io(_) => "IoError",
            Error::Serialization(_) => "SerializationError",
            Error::Storage(_) => "StorageError",
            Error::Config(_) => "ConfigError",
            Error::Locked(_) => "DirectoryLockedError",
        }
    }

    /// Check if this error is retryable.
    ///
    /// Retryable errors (contention, timeouts) may succeed on retry. After a
    /// timeout, check history first: the entry may already be there.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ConcurrentModification { .. } | Error::Timeout { .. } | Error::Conflict(_)
        )
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a concurrency error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::ConcurrentModification { .. } | Error::Conflict(_))
    }

    /// Check if this is an ambiguous merge.
    pub fn is_ambiguous_merge(&self) -> bool {
        matches!(self, Error::AmbiguousMerge(_))
    }
}

// Convert from internal core errors
impl From<annolog_core::Error> for Error {
    fn from(e: annolog_core::Error) -> Self {
        use annolog_core::Error as CoreError;
        match e {
            CoreError::Validation(msg) => Error::Validation(msg),
            CoreError::VersionConflict {
                parent,
                expected,
                actual,
            } => Error::Conflict(format!(
                "record {}: expected version {}, found {}",
                parent, expected, actual
            )),
            CoreError::ConcurrentModification { parent, attempts } => {
                Error::ConcurrentModification { parent, attempts }
            }
            CoreError::AppendTimeout { parent, elapsed_ms } => Error::Timeout { parent, elapsed_ms },
            CoreError::AmbiguousMerge(err) => Error::AmbiguousMerge(err),
            CoreError::Io(io_err) => Error::Io(io_err),
            CoreError::Serialization(msg) => Error::Serialization(msg),
            CoreError::Corruption(msg) => Error::Storage(format!("corruption: {}", msg)),
            CoreError::Config(msg) => Error::Config(msg),
            CoreError::Locked { path } => Error::Locked(path),
            CoreError::WalPoisoned(msg) => Error::Storage(format!("write-ahead log unavailable: {}", msg)),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Convert from TOML errors
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
