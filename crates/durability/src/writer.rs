//! WAL file writer
//!
//! Appends framed records to the log file and applies the fsync policy of
//! the configured [`DurabilityMode`].
//!
//! Every frame is written straight to the file, so it reaches the OS before
//! `append` returns; only the fsync is deferred by the mode. The fsync itself
//! runs through a [`WalSyncer`] that the caller may invoke after releasing
//! the writer's lock.
//!
//! A failed write rewinds the file to the end of the last whole frame. If
//! that rewind or a later fsync fails, the writer is poisoned and refuses
//! every append until the store is reopened.

use crate::encoding::encode_record;
use crate::mode::DurabilityMode;
use crate::wal::WalRecord;
use annolog_core::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Handle that fsyncs the WAL file without holding the writer
#[derive(Debug, Clone)]
pub struct WalSyncer {
    file: Arc<File>,
}

impl WalSyncer {
    /// fsync every frame written so far
    pub fn sync(&self) -> std::io::Result<()> {
        self.file.sync_data()
    }
}

/// Append-only writer over one WAL file
///
/// Not thread-safe on its own; the store wraps it in a mutex.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    syncer: WalSyncer,
    mode: DurabilityMode,
    len: u64,
    unsynced: usize,
    last_sync: Instant,
    poisoned: Option<String>,
}

impl WalWriter {
    /// Open (or create) a WAL file for appending
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();
        let syncer = WalSyncer {
            file: Arc::new(file.try_clone()?),
        };
        debug!(path = %path.display(), len, mode = mode.description(), "opened WAL");
        Ok(Self {
            path,
            file,
            syncer,
            mode,
            len,
            unsynced: 0,
            last_sync: Instant::now(),
            poisoned: None,
        })
    }

    /// Append one record
    ///
    /// Returns a [`WalSyncer`] when the durability mode wants an fsync now.
    /// The record is durable only once that sync succeeds; if it fails the
    /// caller must [`poison`](Self::poison) the writer.
    pub fn append(&mut self, record: &WalRecord) -> Result<Option<WalSyncer>> {
        if let Some(reason) = &self.poisoned {
            return Err(Error::WalPoisoned(reason.clone()));
        }
        let frame = encode_record(record)?;
        if let Err(e) = self.file.write_all(&frame) {
            warn!(path = %self.path.display(), error = %e, "WAL write failed, rewinding");
            self.rewind();
            return Err(e.into());
        }
        self.len += frame.len() as u64;
        self.unsynced += 1;

        if self.sync_due() {
            self.unsynced = 0;
            self.last_sync = Instant::now();
            return Ok(Some(self.syncer.clone()));
        }
        Ok(None)
    }

    /// fsync now, poisoning the writer on failure
    pub fn sync(&mut self) -> Result<()> {
        if let Err(e) = self.syncer.sync() {
            self.poison(format!("fsync failed: {}", e));
            return Err(e.into());
        }
        self.unsynced = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Refuse every later append
    ///
    /// Frames already written may or may not be on disk; reopening replays
    /// whatever survived.
    pub fn poison(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        error!(path = %self.path.display(), %reason, "WAL poisoned");
        self.poisoned = Some(reason);
    }

    /// Whether an earlier failure disabled the writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Path of the WAL file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes of whole frames in the file
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether nothing was ever written
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Commits written since the last fsync
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }

    fn sync_due(&self) -> bool {
        match self.mode {
            DurabilityMode::Strict => true,
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                self.unsynced >= batch_size.max(1)
                    || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
            }
            DurabilityMode::None => false,
        }
    }

    /// Cut the file back to the end of the last whole frame
    fn rewind(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            self.poison(format!("could not rewind after a failed write: {}", e));
        }
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if self.unsynced == 0 || self.is_poisoned() {
            return;
        }
        if let Err(e) = self.syncer.sync() {
            warn!(path = %self.path.display(), error = %e, "failed to sync WAL on drop");
        }
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.len)
            .field("unsynced", &self.unsynced)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
