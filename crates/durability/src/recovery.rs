//! Crash recovery by WAL replay
//!
//! ## Recovery Sequence
//!
//! 1. Read the WAL file front to back, one frame at a time
//! 2. Hand every intact record to the caller's apply function
//! 3. Stop at the first torn or corrupt frame
//! 4. Truncate the file to the last intact frame so new appends follow it
//!
//! ## Key Principle
//!
//! After recovery, every record's log corresponds to a **prefix of its
//! committed history**. A commit is either fully replayed or not at all.
//!
//! ## Usage
//!
//! ```ignore
//! let stats = WalReplay::replay(&wal_path, |record| store.apply(record))?;
//! println!("{}", stats.summary());
//! ```

use crate::encoding::{decode_record, FrameRead};
use crate::wal::WalRecord;
use annolog_core::error::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

// ============================================================================
// Recovery Result
// ============================================================================

/// Outcome of a WAL replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Intact frames read from the WAL
    pub frames_replayed: u64,
    /// Commit records applied
    pub commits_applied: u64,
    /// Legacy seed records applied
    pub legacy_seeds: u64,
    /// Records the apply function rejected (conflict or validation)
    pub records_rejected: u64,
    /// Bytes cut from the tail of the WAL
    pub bytes_truncated: u64,
    /// Whether replay stopped at a checksum or decoding failure
    /// rather than a torn tail
    pub stopped_at_corruption: bool,
    /// Total replay time (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryStats {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} frames, {} commits, {} legacy seeds, {} rejected, {} bytes truncated{}, {:.2}ms",
            self.frames_replayed,
            self.commits_applied,
            self.legacy_seeds,
            self.records_rejected,
            self.bytes_truncated,
            if self.stopped_at_corruption {
                " (corruption)"
            } else {
                ""
            },
            self.recovery_time_micros as f64 / 1000.0,
        )
    }

    /// Check if recovery had any issues (truncation, rejected records)
    pub fn has_issues(&self) -> bool {
        self.bytes_truncated > 0 || self.records_rejected > 0 || self.stopped_at_corruption
    }
}

// ============================================================================
// Replay
// ============================================================================

/// WAL replay driver
pub struct WalReplay;

impl WalReplay {
    /// Replay every intact record in `path` through `apply`
    ///
    /// A missing file is an empty log. `apply` errors that mean the record no
    /// longer fits the rebuilt state (`VersionConflict`, `Validation`) are
    /// counted and skipped; any other error aborts recovery.
    pub fn replay<F>(path: &Path, mut apply: F) -> Result<RecoveryStats>
    where
        F: FnMut(WalRecord) -> Result<()>,
    {
        let start = Instant::now();
        let mut stats = RecoveryStats::default();

        if !path.exists() {
            debug!(path = %path.display(), "no WAL file, starting empty");
            return Ok(stats);
        }

        let bytes = std::fs::read(path)?;
        let mut offset = 0usize;

        while offset < bytes.len() {
            match decode_record(&bytes[offset..]) {
                FrameRead::Record { record, frame_len } => {
                    stats.frames_replayed += 1;
                    let is_commit = record.is_commit();
                    let parent = record.parent();
                    match apply(record) {
                        Ok(()) if is_commit => stats.commits_applied += 1,
                        Ok(()) => stats.legacy_seeds += 1,
                        Err(e @ (Error::VersionConflict { .. } | Error::Validation(_))) => {
                            warn!(%parent, offset, error = %e, "skipping WAL record that does not apply");
                            stats.records_rejected += 1;
                        }
                        Err(e) => return Err(e),
                    }
                    offset += frame_len;
                }
                FrameRead::Incomplete => {
                    warn!(offset, "torn frame at WAL tail");
                    break;
                }
                FrameRead::Corrupt(reason) => {
                    warn!(offset, %reason, "corrupt WAL frame, discarding remainder");
                    stats.stopped_at_corruption = true;
                    break;
                }
            }
        }

        if offset < bytes.len() {
            stats.bytes_truncated = (bytes.len() - offset) as u64;
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset as u64)?;
            file.sync_all()?;
        }

        stats.recovery_time_micros = start.elapsed().as_micros() as u64;
        info!("{}", stats.summary());
        Ok(stats)
    }
}
