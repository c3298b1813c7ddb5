//! Durability mode for WAL operations.
//!
//! Defines the durability guarantees for WAL writes.

use serde::{Deserialize, Serialize};

/// Durability mode for WAL writes.
///
/// Controls when data is fsynced to disk and the trade-off between
/// append latency and the data-loss window on crash.
///
/// # Mode Comparison
///
/// | Mode | WAL | fsync | Data Loss Window |
/// |------|-----|-------|------------------|
/// | None | bypassed | never | everything |
/// | Batched | append | every N commits or T ms | bounded |
/// | Strict | append | every commit | zero |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// No durability - all data lost when the process exits.
    ///
    /// Bypasses WAL entirely. No fsync, no file I/O.
    None,

    /// fsync after every commit (slow, maximum durability).
    ///
    /// Use when losing a single note is unacceptable.
    Strict,

    /// fsync every N commits OR every T milliseconds.
    ///
    /// Frames reach the OS on every append, so a process crash loses nothing.
    /// A machine crash may lose the commits since the last fsync. Both limits
    /// are checked when a commit is written; there is no background timer, so
    /// an idle store keeps its last frames unsynced until the next commit,
    /// `flush`, or close.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence.
    ///
    /// Returns false for None mode, true for all others.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires immediate fsync on every commit.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, all data lost on exit)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Create a buffered mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 64 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 64,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_mode() {
        let mode = DurabilityMode::None;
        assert!(!mode.requires_wal());
        assert!(!mode.requires_immediate_fsync());
    }

    #[test]
    fn test_strict_mode() {
        let mode = DurabilityMode::Strict;
        assert!(mode.requires_wal());
        assert!(mode.requires_immediate_fsync());
    }

    #[test]
    fn test_default_is_batched() {
        match DurabilityMode::default() {
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                assert_eq!(interval_ms, 100);
                assert_eq!(batch_size, 64);
            }
            other => panic!("Expected Batched mode, got {:?}", other),
        }
    }
}
