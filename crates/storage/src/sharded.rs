//! Sharded per-record annotation store
//!
//! One cell per parent record, held in a DashMap keyed by [`ParentId`].
//!
//! # Design
//!
//! - DashMap: sharded map of parent id to cell, no global lock
//! - RecordCell: a commit mutex guarding the record's entry-id index, plus
//!   the current `Arc<LogSnapshot>`
//! - Commit: lock the cell's commit mutex, check the version, write the WAL
//!   record, fsync with the WAL lock released, then swap in the new snapshot
//!   under a brief write lock
//! - Read: clone the current `Arc`; never waits on WAL I/O
//! - Different parents: share only the WAL append lock, never an fsync
//!
//! The only mutation path is the version-guarded commit. There is no
//! whole-log overwrite.
//!
//! A durable store holds an exclusive lock on `LOCK_FILENAME` in its data
//! directory for as long as it is open. A second open of the same directory,
//! from this process or another, fails with [`Error::Locked`].

use annolog_core::error::{Error, Result};
use annolog_core::{AnnotationEntry, EntryId, LogSnapshot, ParentId};
use annolog_core::EntryLog;
use annolog_durability::{DurabilityMode, RecoveryStats, WalRecord, WalReplay, WalWriter, WAL_FILENAME};
use dashmap::DashMap;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lock file held by an open durable store
pub const LOCK_FILENAME: &str = "annolog.lock";

/// Ids of every entry committed to one record
type IdIndex = FxHashSet<EntryId>;

/// Per-record state
///
/// `commit` serializes writers of this record only and guards the id index.
/// `state` is held for the duration of an `Arc` clone or swap, never across
/// I/O.
#[derive(Debug)]
struct RecordCell {
    commit: Mutex<IdIndex>,
    state: RwLock<Arc<LogSnapshot>>,
}

impl RecordCell {
    fn new(parent: ParentId) -> Self {
        Self {
            commit: Mutex::new(IdIndex::default()),
            state: RwLock::new(LogSnapshot::empty_shared(parent)),
        }
    }

    fn current(&self) -> Arc<LogSnapshot> {
        Arc::clone(&self.state.read())
    }
}

/// Durable, per-record, version-guarded annotation log store
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - read(): clones the record's snapshot `Arc`
/// - commit_batch(): locks the target record's commit mutex, plus the WAL
///   mutex for the duration of one unbuffered write
/// - Different records never wait on each other's fsync
///
/// # Example
///
/// ```ignore
/// use annolog_storage::AnnotationStore;
///
/// let store = AnnotationStore::new();
/// let snapshot = store.read(&ParentId::new(42));
/// let version = store.commit_append(ParentId::new(42), entry, snapshot.version)?;
/// ```
pub struct AnnotationStore {
    records: DashMap<ParentId, Arc<RecordCell>>,
    wal: Option<Mutex<WalWriter>>,
    mode: DurabilityMode,
    commits: AtomicU64,
    dir_lock: Option<File>,
}

impl AnnotationStore {
    /// Create an in-memory store with no write-ahead log
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            wal: None,
            mode: DurabilityMode::None,
            commits: AtomicU64::new(0),
            dir_lock: None,
        }
    }

    /// Open a durable store in `dir`, replaying any existing WAL
    ///
    /// Fails with [`Error::Locked`] if another open store holds `dir`. With
    /// [`DurabilityMode::None`] the directory is locked but the WAL is never
    /// read or written.
    pub fn open(dir: impl AsRef<Path>, mode: DurabilityMode) -> Result<(Self, RecoveryStats)> {
        Self::open_waiting(dir, mode, Duration::ZERO)
    }

    /// Like [`open`](Self::open), but keep retrying a held directory lock
    /// for up to `lock_wait`
    pub fn open_waiting(
        dir: impl AsRef<Path>,
        mode: DurabilityMode,
        lock_wait: Duration,
    ) -> Result<(Self, RecoveryStats)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut store = Self::new();
        store.mode = mode;
        store.dir_lock = Some(acquire_dir_lock(dir, lock_wait)?);
        if !mode.requires_wal() {
            return Ok((store, RecoveryStats::default()));
        }

        let path = dir.join(WAL_FILENAME);
        let stats = WalReplay::replay(&path, |record| store.apply(record))?;
        if stats.frames_replayed > 0 {
            info!(
                path = %path.display(),
                records = store.records.len(),
                "rebuilt annotation store from WAL"
            );
        }

        store.wal = Some(Mutex::new(WalWriter::open(&path, mode)?));
        Ok((store, stats))
    }

    /// Durability mode the store was opened with
    pub fn durability_mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Path of the WAL file, if the store is durable
    pub fn wal_path(&self) -> Option<PathBuf> {
        self.wal.as_ref().map(|w| w.lock().path().to_path_buf())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current snapshot of a record's log
    ///
    /// Always succeeds; a record never written to reads as an empty log at
    /// version 0. May trail a commit that is in flight on another thread.
    pub fn read(&self, parent: &ParentId) -> Arc<LogSnapshot> {
        self.records
            .get(parent)
            .map(|cell| cell.current())
            .unwrap_or_else(|| LogSnapshot::empty_shared(*parent))
    }

    /// Current version of a record's log
    pub fn version(&self, parent: &ParentId) -> u64 {
        self.read(parent).version
    }

    /// Every record that has been written to, in ascending id order
    pub fn parents(&self) -> Vec<ParentId> {
        let mut parents: Vec<ParentId> = self
            .records
            .iter()
            .filter(|e| !e.value().current().is_blank())
            .map(|e| *e.key())
            .collect();
        parents.sort_unstable();
        parents
    }

    /// Number of records held
    pub fn record_count(&self) -> usize {
        self.records
            .iter()
            .filter(|e| !e.value().current().is_blank())
            .count()
    }

    /// Successful mutations since the store was opened (replay excluded)
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Conditional writes
    // ========================================================================

    /// Append one entry iff the record is still at `expected_version`
    ///
    /// Returns the new version. On mismatch fails with
    /// [`Error::VersionConflict`] and changes nothing.
    pub fn commit_append(
        &self,
        parent: ParentId,
        entry: AnnotationEntry,
        expected_version: u64,
    ) -> Result<u64> {
        self.commit_batch(parent, vec![entry], expected_version, false)
    }

    /// Append a batch of entries iff the record is still at `expected_version`
    ///
    /// The batch lands atomically: all entries in order, or none. The version
    /// grows by the batch length. `clear_legacy` drops the record's raw legacy
    /// column in the same commit; only then may `entries` be empty.
    pub fn commit_batch(
        &self,
        parent: ParentId,
        entries: Vec<AnnotationEntry>,
        expected_version: u64,
        clear_legacy: bool,
    ) -> Result<u64> {
        let version = self.commit(WalRecord::Commit {
            parent,
            expected_version,
            entries,
            clear_legacy,
        })?;
        debug!(%parent, version, "committed");
        Ok(version)
    }

    /// Attach a raw legacy column to a record that holds nothing yet
    ///
    /// Stored verbatim; normalization happens on read or migration. Fails
    /// with [`Error::Validation`] if the record already has entries or a
    /// legacy column.
    pub fn seed_legacy(&self, parent: ParentId, raw: String) -> Result<()> {
        self.commit(WalRecord::SeedLegacy { parent, raw })?;
        debug!(%parent, "seeded legacy column");
        Ok(())
    }

    /// fsync every WAL frame written so far
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.lock().sync()?;
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn cell(&self, parent: ParentId) -> Arc<RecordCell> {
        if let Some(cell) = self.records.get(&parent) {
            return Arc::clone(cell.value());
        }
        Arc::clone(
            self.records
                .entry(parent)
                .or_insert_with(|| Arc::new(RecordCell::new(parent)))
                .value(),
        )
    }

    /// Check, log, then publish one mutation under the record's commit lock
    fn commit(&self, record: WalRecord) -> Result<u64> {
        if let WalRecord::Commit {
            entries,
            clear_legacy,
            ..
        } = &record
        {
            validate_batch(entries, *clear_legacy)?;
        }
        let cell = self.cell(record.parent());
        let mut ids = cell.commit.lock();
        let current = cell.current();
        check(&current, &ids, &record)?;
        if let Some(wal) = &self.wal {
            self.log(wal, &record)?;
        }
        let version = install(&cell, &mut ids, &current, record);
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(version)
    }

    /// Write `record` to the WAL and fsync it if the mode asks
    ///
    /// The fsync runs after the WAL lock is released, so commits to other
    /// records keep appending while it is in flight. A failed fsync leaves
    /// the frame's fate unknown, so the writer is poisoned.
    fn log(&self, wal: &Mutex<WalWriter>, record: &WalRecord) -> Result<()> {
        let pending = wal.lock().append(record)?;
        if let Some(syncer) = pending {
            if let Err(e) = syncer.sync() {
                wal.lock().poison(format!("fsync failed: {}", e));
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Apply a replayed WAL record through the same checks as a live commit
    fn apply(&self, record: WalRecord) -> Result<()> {
        let cell = self.cell(record.parent());
        let mut ids = cell.commit.lock();
        let current = cell.current();
        check(&current, &ids, &record)?;
        install(&cell, &mut ids, &current, record);
        Ok(())
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("records", &self.records.len())
            .field("mode", &self.mode)
            .field("durable", &self.wal.is_some())
            .field("dir_locked", &self.dir_lock.is_some())
            .finish()
    }
}

/// Take the directory lock, retrying until `wait` has passed
fn acquire_dir_lock(dir: &Path, wait: Duration) -> Result<File> {
    let path = dir.join(LOCK_FILENAME);
    let file = OpenOptions::new().create(true).write(true).open(&path)?;
    let started = Instant::now();
    loop {
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => return Ok(file),
            Err(e) if started.elapsed() < wait => {
                debug!(path = %path.display(), error = %e, "data directory busy, waiting");
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "data directory is locked");
                return Err(Error::Locked {
                    path: dir.to_path_buf(),
                });
            }
        }
    }
}

fn check(current: &LogSnapshot, ids: &IdIndex, record: &WalRecord) -> Result<()> {
    match record {
        WalRecord::Commit {
            expected_version,
            entries,
            clear_legacy,
            ..
        } => {
            validate_batch(entries, *clear_legacy)?;
            if current.version != *expected_version {
                return Err(Error::VersionConflict {
                    parent: current.parent,
                    expected: *expected_version,
                    actual: current.version,
                });
            }
            reject_known_ids(current.parent, ids, entries)
        }
        WalRecord::SeedLegacy { .. } => {
            if !current.is_blank() {
                return Err(Error::Validation(format!(
                    "record {} already holds annotations",
                    current.parent
                )));
            }
            Ok(())
        }
    }
}

fn validate_batch(entries: &[AnnotationEntry], clear_legacy: bool) -> Result<()> {
    if entries.is_empty() && !clear_legacy {
        return Err(Error::Validation("commit must carry at least one entry".into()));
    }
    let mut seen: FxHashSet<&EntryId> = FxHashSet::default();
    for entry in entries {
        if !entry.is_well_formed() {
            return Err(Error::Validation(format!(
                "entry {} has empty author or content",
                entry.id
            )));
        }
        if !seen.insert(&entry.id) {
            return Err(Error::Validation(format!("duplicate entry id {} in batch", entry.id)));
        }
    }
    Ok(())
}

fn reject_known_ids(parent: ParentId, ids: &IdIndex, entries: &[AnnotationEntry]) -> Result<()> {
    match entries.iter().find(|e| ids.contains(&e.id)) {
        Some(dup) => Err(Error::Validation(format!(
            "entry id {} already present in record {}",
            dup.id, parent
        ))),
        None => Ok(()),
    }
}

/// Swap in the snapshot that results from `record`; returns the new version
///
/// The new snapshot shares the existing entry chunks, so the cost is the
/// batch size, not the record's history.
fn install(cell: &RecordCell, ids: &mut IdIndex, current: &LogSnapshot, record: WalRecord) -> u64 {
    let next = match record {
        WalRecord::Commit {
            entries,
            clear_legacy,
            ..
        } => {
            ids.extend(entries.iter().map(|e| e.id.clone()));
            LogSnapshot {
                parent: current.parent,
                version: current.version + entries.len() as u64,
                entries: current.entries.appended(entries),
                legacy: if clear_legacy {
                    None
                } else {
                    current.legacy.clone()
                },
            }
        }
        WalRecord::SeedLegacy { raw, .. } => LogSnapshot {
            parent: current.parent,
            entries: EntryLog::new(),
            version: current.version,
            legacy: Some(raw),
        },
    };
    let version = next.version;
    *cell.state.write() = Arc::new(next);
    version
}
