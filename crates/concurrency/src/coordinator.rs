//! Append coordinator for optimistic, version-guarded commits
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. read() the record's snapshot - only to learn its version
//! 2. plan the commit from that snapshot (new entry, pending legacy entries)
//! 3. commit_batch(expected_version = snapshot.version)
//! 4. IF VersionConflict: back off (jittered), go to 1
//! 5. IF attempts exhausted: ConcurrentModification
//! ```
//!
//! Nothing is written by a losing attempt, so a retry never duplicates an
//! entry. A deadline that passes between attempts returns `AppendTimeout`;
//! the caller must treat that as "outcome unknown" because an earlier
//! attempt's commit is never reverted.

use crate::retry::RetryPolicy;
use crate::DEFAULT_AUTHOR;
use annolog_core::error::{Error, Result};
use annolog_core::{AnnotationEntry, EntryId, LogSnapshot, Origin, ParentId};
use annolog_storage::AnnotationStore;
use chrono::Utc;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What one attempt of a read-plan-commit loop should do
#[derive(Debug, Clone, PartialEq)]
pub enum CommitPlan<T> {
    /// Conditionally commit `entries` against the snapshot's version
    Commit {
        /// Entries to append, in order
        entries: Vec<AnnotationEntry>,
        /// Whether the commit also clears the legacy column
        clear_legacy: bool,
        /// Returned to the caller if the commit lands
        output: T,
    },
    /// Nothing to write; return `T` as is
    Done(T),
}

/// Result of a successful append
#[derive(Debug, Clone, PartialEq)]
pub struct AppendReceipt {
    /// The entry as persisted
    pub entry: AnnotationEntry,
    /// Record version after the commit
    pub version: u64,
}

/// Result of a legacy migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Normalized legacy entries moved into the canonical log
    pub migrated: usize,
    /// Record version afterwards
    pub version: u64,
}

/// Point-in-time copy of coordinator counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorMetrics {
    /// Successful appends
    pub appends: u64,
    /// Version conflicts observed (each one triggered a retry or exhaustion)
    pub conflicts: u64,
    /// Operations that ran out of attempts
    pub exhausted: u64,
    /// Operations that hit the caller deadline
    pub timeouts: u64,
    /// Legacy columns migrated
    pub migrations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    appends: AtomicU64,
    conflicts: AtomicU64,
    exhausted: AtomicU64,
    timeouts: AtomicU64,
    migrations: AtomicU64,
}

/// Public append contract over an [`AnnotationStore`]
///
/// # Thread Safety
///
/// Shareable across threads. The coordinator holds no locks of its own;
/// every serialization point is the store's per-record commit.
#[derive(Debug)]
pub struct AppendCoordinator {
    store: Arc<AnnotationStore>,
    policy: RetryPolicy,
    default_author: String,
    counters: Counters,
}

impl AppendCoordinator {
    /// Create a coordinator with the default policy and author
    pub fn new(store: Arc<AnnotationStore>) -> Self {
        Self::with_policy(store, RetryPolicy::default(), DEFAULT_AUTHOR)
    }

    /// Create a coordinator with an explicit policy and fallback author
    pub fn with_policy(
        store: Arc<AnnotationStore>,
        policy: RetryPolicy,
        default_author: impl Into<String>,
    ) -> Self {
        Self {
            store,
            policy,
            default_author: default_author.into(),
            counters: Counters::default(),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<AnnotationStore> {
        &self.store
    }

    /// Retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Author used when a caller supplies none
    pub fn default_author(&self) -> &str {
        &self.default_author
    }

    /// Append one annotation to a record
    ///
    /// `content` must be non-empty after trimming and is stored verbatim.
    /// A missing or blank `author` falls back to the default author. If the
    /// record still carries an un-migrated legacy column, it is migrated in
    /// the same commit.
    ///
    /// # Errors
    ///
    /// - `Validation` if `content` is blank (nothing is read or written)
    /// - `ConcurrentModification` if every attempt lost a version race
    /// - `AppendTimeout` if the policy deadline passed between attempts
    pub fn append(
        &self,
        parent: ParentId,
        author: Option<&str>,
        content: &str,
    ) -> Result<AppendReceipt> {
        if content.trim().is_empty() {
            return Err(Error::Validation("annotation content must not be empty".into()));
        }
        let author = resolve_author(author, &self.default_author);
        let id = EntryId::new();

        let ((entry, migrated), version) = self.commit_with_retry(parent, |snapshot| {
            let entry = AnnotationEntry {
                id: id.clone(),
                author: author.clone(),
                content: content.to_string(),
                created_at: Some(Utc::now()),
                origin: Origin::Native,
            };
            let mut entries = pending_legacy(snapshot);
            let migrated = entries.len();
            let clear_legacy = snapshot.legacy.is_some();
            entries.push(entry.clone());
            Ok(CommitPlan::Commit {
                entries,
                clear_legacy,
                output: (entry, clear_legacy.then_some(migrated)),
            })
        })?;

        self.counters.appends.fetch_add(1, Ordering::Relaxed);
        if let Some(migrated) = migrated {
            self.counters.migrations.fetch_add(1, Ordering::Relaxed);
            info!(%parent, migrated, "migrated legacy column on append");
        }
        debug!(%parent, id = %entry.id, version, "appended annotation");
        Ok(AppendReceipt { entry, version })
    }

    /// Move a record's legacy column into its canonical log
    ///
    /// A record without a legacy column is left untouched and reports zero
    /// migrated entries.
    pub fn migrate_legacy(&self, parent: ParentId) -> Result<MigrationReport> {
        let (migrated, version) = self.commit_with_retry(parent, |snapshot| {
            if snapshot.legacy.is_none() {
                return Ok(CommitPlan::Done(None));
            }
            let entries = pending_legacy(snapshot);
            let migrated = entries.len();
            Ok(CommitPlan::Commit {
                entries,
                clear_legacy: true,
                output: Some(migrated),
            })
        })?;

        match migrated {
            Some(migrated) => {
                self.counters.migrations.fetch_add(1, Ordering::Relaxed);
                info!(%parent, migrated, version, "migrated legacy column");
                Ok(MigrationReport { migrated, version })
            }
            None => Ok(MigrationReport {
                migrated: 0,
                version,
            }),
        }
    }

    /// Run a read-plan-commit loop under the retry policy
    ///
    /// `plan` sees a fresh snapshot on every attempt and must derive its
    /// commit from that snapshot alone. Returns the plan's output and the
    /// version it committed at (or the snapshot's version for
    /// [`CommitPlan::Done`]).
    pub fn commit_with_retry<T, F>(&self, parent: ParentId, mut plan: F) -> Result<(T, u64)>
    where
        F: FnMut(&LogSnapshot) -> Result<CommitPlan<T>>,
    {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                if let Some(timeout) = self.policy.timeout {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                        warn!(%parent, attempt, "append deadline passed, outcome unknown");
                        return Err(Error::AppendTimeout {
                            parent,
                            elapsed_ms: elapsed.as_millis() as u64,
                        });
                    }
                }
            }

            let snapshot = self.store.read(&parent);
            let (entries, clear_legacy, output) = match plan(&snapshot)? {
                CommitPlan::Done(output) => return Ok((output, snapshot.version)),
                CommitPlan::Commit {
                    entries,
                    clear_legacy,
                    output,
                } => (entries, clear_legacy, output),
            };

            match self
                .store
                .commit_batch(parent, entries, snapshot.version, clear_legacy)
            {
                Ok(version) => return Ok((output, version)),
                Err(Error::VersionConflict {
                    expected, actual, ..
                }) => {
                    self.counters.conflicts.fetch_add(1, Ordering::Relaxed);
                    debug!(%parent, attempt, expected, actual, "version conflict");
                    if attempt < max_attempts {
                        std::thread::sleep(self.policy.backoff(attempt));
                    }
                }
                Err(e) => return Err(e),
            }
        }

        self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
        warn!(%parent, attempts = max_attempts, "retry budget exhausted");
        Err(Error::ConcurrentModification {
            parent,
            attempts: max_attempts,
        })
    }

    /// Snapshot of the coordinator counters
    pub fn metrics(&self) -> CoordinatorMetrics {
        CoordinatorMetrics {
            appends: self.counters.appends.load(Ordering::Relaxed),
            conflicts: self.counters.conflicts.load(Ordering::Relaxed),
            exhausted: self.counters.exhausted.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
            migrations: self.counters.migrations.load(Ordering::Relaxed),
        }
    }
}

/// Normalized entries of a snapshot's un-migrated legacy column
///
/// Entries repeating an earlier entry's id are dropped, so the result can
/// always be committed as one batch.
pub fn pending_legacy(snapshot: &LogSnapshot) -> Vec<AnnotationEntry> {
    let Some(raw) = snapshot.legacy.as_deref() else {
        return Vec::new();
    };
    let mut seen: FxHashSet<EntryId> = snapshot.entries.iter().map(|e| e.id.clone()).collect();
    annolog_wire::normalize_column(Some(raw))
        .into_iter()
        .filter(|entry| {
            let fresh = seen.insert(entry.id.clone());
            if !fresh {
                warn!(parent = %snapshot.parent, id = %entry.id, "dropping legacy entry with repeated id");
            }
            fresh
        })
        .collect()
}

fn resolve_author(author: Option<&str>, fallback: &str) -> String {
    author
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
