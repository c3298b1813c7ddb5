//! Main database entry point for annolog.
//!
//! This module provides the `Annolog` struct, the primary entry point for
//! all annotation operations.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::types::{
    AnnotationEntry, AnnotationView, AppendResult, CoordinatorMetrics, DurabilityMode,
    MigrationReport, ParentId, Reconciled, RecoveryStats, RepairReport,
};
use annolog_concurrency::AppendCoordinator;
use annolog_primitives::{HistoryReader, RecoveryTool};
use annolog_storage::AnnotationStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

/// The annotation log database.
///
/// This is the main entry point for all operations. Create a database
/// using [`Annolog::open`], [`Annolog::ephemeral`] or [`Annolog::builder`].
///
/// # Example
///
/// ```ignore
/// use annolog::prelude::*;
///
/// let db = Annolog::open("./notes")?;
///
/// let result = db.append_annotation(42, Some("Kim"), "콜백 예정")?;
/// for note in db.get_annotations(42) {
///     println!("{} {}", note.author, note.content);
/// }
///
/// db.close()?;
/// ```
pub struct Annolog {
    store: Arc<AnnotationStore>,
    coordinator: Arc<AppendCoordinator>,
    history: HistoryReader,
    recovery: RecoveryTool,
    config: EngineConfig,
    data_dir: Option<PathBuf>,
    recovery_stats: RecoveryStats,
    // Held so the directory outlives the store
    _temp_dir: Option<TempDir>,
}

impl Annolog {
    /// Open a database at the given path.
    ///
    /// Uses default settings (buffered durability mode). The directory stays
    /// locked until the database is dropped; opening it again meanwhile fails
    /// with [`Error::Locked`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral database with no disk I/O.
    ///
    /// | Method | Disk Files | Recovery |
    /// |--------|------------|----------|
    /// | `Annolog::ephemeral()` | None | No |
    /// | `Annolog::builder().open_temp()` | Temp dir | Yes |
    /// | `Annolog::open(path)` | User dir | Yes |
    pub fn ephemeral() -> Result<Self> {
        let config = EngineConfig {
            durability: DurabilityMode::None,
            ..EngineConfig::default()
        };
        Self::assemble(
            Arc::new(AnnotationStore::new()),
            config,
            None,
            RecoveryStats::default(),
            None,
        )
    }

    /// Create a builder for database configuration.
    pub fn builder() -> AnnologBuilder {
        AnnologBuilder::new()
    }

    fn assemble(
        store: Arc<AnnotationStore>,
        config: EngineConfig,
        data_dir: Option<PathBuf>,
        recovery_stats: RecoveryStats,
        temp_dir: Option<TempDir>,
    ) -> Result<Self> {
        config.validate()?;
        let coordinator = Arc::new(AppendCoordinator::with_policy(
            Arc::clone(&store),
            config.retry_policy(),
            config.default_author.clone(),
        ));
        Ok(Self {
            history: HistoryReader::new(Arc::clone(&store)),
            recovery: RecoveryTool::new(Arc::clone(&coordinator)),
            store,
            coordinator,
            config,
            data_dir,
            recovery_stats,
            _temp_dir: temp_dir,
        })
    }

    // ========================================================================
    // Appends
    // ========================================================================

    /// Append an annotation and report its id and the new version.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `content` is blank
    /// - [`Error::ConcurrentModification`] if contention outlasted the retry budget
    /// - [`Error::Timeout`] if the configured deadline passed (outcome unknown)
    pub fn append_annotation(
        &self,
        parent: impl Into<ParentId>,
        author: Option<&str>,
        content: &str,
    ) -> Result<AppendResult> {
        let receipt = self.coordinator.append(parent.into(), author, content)?;
        Ok(AppendResult {
            entry_id: receipt.entry.id,
            version: receipt.version,
        })
    }

    /// Append an annotation and return the persisted entry.
    pub fn append(
        &self,
        parent: impl Into<ParentId>,
        author: Option<&str>,
        content: &str,
    ) -> Result<AnnotationEntry> {
        Ok(self.coordinator.append(parent.into(), author, content)?.entry)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// History as `{author, content, createdAt}` views, oldest first.
    pub fn get_annotations(&self, parent: impl Into<ParentId>) -> Vec<AnnotationView> {
        self.history(parent).iter().map(AnnotationView::from).collect()
    }

    /// Full normalized history, oldest first.
    pub fn history(&self, parent: impl Into<ParentId>) -> Vec<AnnotationEntry> {
        self.history.get_history(parent.into())
    }

    /// Number of entries in a record's history.
    pub fn count(&self, parent: impl Into<ParentId>) -> usize {
        self.history.count(parent.into())
    }

    /// Current version of a record's log.
    pub fn version(&self, parent: impl Into<ParentId>) -> u64 {
        self.store.version(&parent.into())
    }

    /// Every record that holds annotations or legacy data.
    pub fn parents(&self) -> Vec<ParentId> {
        self.store.parents()
    }

    /// Canonical JSON array of a record's history, usable as a repair backup.
    pub fn export_snapshot(&self, parent: impl Into<ParentId>) -> Value {
        self.history.export_snapshot(parent.into())
    }

    // ========================================================================
    // Legacy data
    // ========================================================================

    /// Attach the raw text of a legacy feedback column to a record.
    ///
    /// The text is stored verbatim and normalized on read. Blank text is
    /// ignored and reported as `false`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the record already holds annotations or
    /// legacy data.
    pub fn import_legacy(&self, parent: impl Into<ParentId>, column_text: &str) -> Result<bool> {
        if column_text.trim().is_empty() {
            return Ok(false);
        }
        self.store.seed_legacy(parent.into(), column_text.to_string())?;
        Ok(true)
    }

    /// Move a record's legacy column into its canonical log.
    pub fn migrate(&self, parent: impl Into<ParentId>) -> Result<MigrationReport> {
        Ok(self.coordinator.migrate_legacy(parent.into())?)
    }

    // ========================================================================
    // Repair
    // ========================================================================

    /// Append every backup entry the record is missing.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousMerge`] when the backup conflicts with the live
    /// history. Nothing is written in that case.
    pub fn repair_log(&self, parent: impl Into<ParentId>, backup: &Value) -> Result<RepairReport> {
        Ok(self.recovery.repair_log(parent.into(), backup)?)
    }

    /// Merge two raw snapshots offline. Touches no store.
    pub fn reconcile(a: &Value, b: &Value) -> Result<Reconciled> {
        Ok(annolog_primitives::reconcile(a, b)?)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Force flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.store.flush().map_err(Error::from)
    }

    /// Gracefully close the database.
    ///
    /// Flushes pending writes. The WAL file handle is released on drop.
    pub fn close(&self) -> Result<()> {
        self.flush()?;
        info!(records = self.store.record_count(), "annolog closed");
        Ok(())
    }

    /// Get the database directory path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Check if this is an ephemeral (no-disk) database.
    pub fn is_ephemeral(&self) -> bool {
        self.data_dir.is_none()
    }

    /// Get the current durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.store.durability_mode()
    }

    /// Configuration in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// What WAL replay found when the database was opened.
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery_stats
    }

    /// Get database metrics.
    pub fn metrics(&self) -> DatabaseMetrics {
        DatabaseMetrics {
            records: self.store.record_count(),
            commits: self.store.commit_count(),
            coordinator: self.coordinator.metrics(),
        }
    }
}

impl std::fmt::Debug for Annolog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annolog")
            .field("data_dir", &self.data_dir)
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

/// Database metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseMetrics {
    /// Records holding annotations or legacy data
    pub records: usize,
    /// Successful store mutations since open
    pub commits: u64,
    /// Append coordinator counters
    pub coordinator: CoordinatorMetrics,
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Production: disk-backed with durability
/// let db = Annolog::builder()
///     .path("./notes")
///     .strict()
///     .open()?;
///
/// // Integration testing: temp directory
/// let db = Annolog::builder().open_temp()?;
///
/// // Unit testing: truly ephemeral (no disk at all)
/// let db = Annolog::ephemeral()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnnologBuilder {
    path: Option<PathBuf>,
    config: EngineConfig,
}

impl AnnologBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database directory path.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use strict mode (fsync on every commit).
    pub fn strict(mut self) -> Self {
        self.config.durability = DurabilityMode::Strict;
        self
    }

    /// Use buffered mode (default).
    ///
    /// Default flush interval: 100ms or 64 commits.
    pub fn buffered(mut self) -> Self {
        self.config.durability = DurabilityMode::buffered_default();
        self
    }

    /// Use buffered mode with custom parameters.
    pub fn buffered_with(mut self, interval_ms: u64, batch_size: usize) -> Self {
        self.config.durability = DurabilityMode::Batched {
            interval_ms,
            batch_size,
        };
        self
    }

    /// Skip the WAL entirely. All data is lost when the database is dropped.
    pub fn no_durability(mut self) -> Self {
        self.config.durability = DurabilityMode::None;
        self
    }

    /// Commit attempts per append.
    pub fn max_append_retries(mut self, attempts: u32) -> Self {
        self.config.max_append_retries = attempts;
        self
    }

    /// Author recorded when a caller supplies none.
    pub fn default_author(mut self, author: impl Into<String>) -> Self {
        self.config.default_author = author.into();
        self
    }

    /// Wait up to `wait` for another process to release the data directory.
    pub fn lock_wait(mut self, wait: std::time::Duration) -> Self {
        self.config.lock_wait_ms = wait.as_millis() as u64;
        self
    }

    /// Caller deadline for a single append.
    pub fn append_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.append_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Open the database.
    ///
    /// Uses the configured path, or a temp directory if none set.
    pub fn open(self) -> Result<Annolog> {
        match self.path.clone() {
            Some(path) => self.open_at(path, None),
            None => self.open_temp(),
        }
    }

    /// Open a database in a fresh temporary directory.
    ///
    /// The directory is removed when the database is dropped.
    pub fn open_temp(self) -> Result<Annolog> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().to_path_buf();
        self.open_at(path, Some(temp))
    }

    fn open_at(self, path: PathBuf, temp: Option<TempDir>) -> Result<Annolog> {
        self.config.validate()?;
        let (store, stats) =
            AnnotationStore::open_waiting(&path, self.config.durability, self.config.lock_wait())?;
        if stats.has_issues() {
            tracing::warn!(path = %path.display(), "{}", stats.summary());
        }
        Annolog::assemble(Arc::new(store), self.config, Some(path), stats, temp)
    }
}
