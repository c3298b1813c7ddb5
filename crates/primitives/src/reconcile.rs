//! Reconciliation of two divergent snapshots of one record's log
//!
//! ## Dedup key
//!
//! `(author, content key, created_at truncated to the second)`, where the
//! content key is the content with whitespace runs collapsed and trimmed.
//!
//! - An entry with a null timestamp joins the earliest timestamped bucket of
//!   its `(author, content key)` group, or a null bucket if there is none.
//! - A bucket whose members disagree on the raw content text is ambiguous.
//! - Native ids are identities: two entries with the same native id that
//!   do not describe the same note are ambiguous too.
//!
//! ## Determinism
//!
//! The kept instance of a bucket is the minimum under
//! `(timestamp missing, origin, id, ...)`, and output is sorted by
//! `(created_at nulls-first, author, content, id)`. Neither depends on
//! argument order, which makes `reconcile` commutative and idempotent.

use annolog_core::error::Result;
use annolog_core::{
    AmbiguousMergeError, AnnotationEntry, ConflictReason, EntryId, MergeConflict, Origin,
    Timestamp,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of a clean merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Union of both snapshots, one entry per dedup key, canonically ordered
    pub merged: Vec<AnnotationEntry>,
    /// Merged entries whose key the first snapshot did not hold
    pub added: Vec<AnnotationEntry>,
}

impl Reconciled {
    /// Number of entries the second snapshot contributed
    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}

/// Merge two raw snapshots after normalizing both
///
/// # Errors
///
/// `AmbiguousMerge` carrying every conflicting pair and the merged entries
/// of all unambiguous keys.
pub fn reconcile(a: &Value, b: &Value) -> Result<Reconciled> {
    reconcile_entries(&annolog_wire::normalize(a), &annolog_wire::normalize(b))
}

/// Merge two already-normalized entry sequences
pub fn reconcile_entries(a: &[AnnotationEntry], b: &[AnnotationEntry]) -> Result<Reconciled> {
    let mut conflicts = Vec::new();
    let tagged = a.iter().map(|e| (e, true)).chain(b.iter().map(|e| (e, false)));
    let candidates = collapse_ids(tagged, &mut conflicts);

    let mut groups: FxHashMap<(&str, String), Vec<&Candidate>> = FxHashMap::default();
    for candidate in &candidates {
        let key = (
            candidate.entry.author.as_str(),
            content_key(&candidate.entry.content),
        );
        groups.entry(key).or_default().push(candidate);
    }

    let mut merged = Vec::new();
    let mut added = Vec::new();
    for members in groups.into_values() {
        let anchor = members.iter().filter_map(|c| c.entry.created_second()).min();
        let mut buckets: BTreeMap<Option<i64>, Vec<&Candidate>> = BTreeMap::new();
        for candidate in members {
            let second = candidate.entry.created_second().or(anchor);
            buckets.entry(second).or_default().push(candidate);
        }

        for bucket in buckets.into_values() {
            match resolve_bucket(&bucket) {
                Ok(kept) => {
                    if !bucket.iter().any(|c| c.in_a) {
                        added.push(kept.clone());
                    }
                    merged.push(kept.clone());
                }
                Err(pairs) => conflicts.extend(pairs),
            }
        }
    }

    merged.sort_by(|x, y| canonical_key(x).cmp(&canonical_key(y)));
    added.sort_by(|x, y| canonical_key(x).cmp(&canonical_key(y)));

    if !conflicts.is_empty() {
        conflicts.sort_by(|x, y| {
            (canonical_key(&x.left), canonical_key(&x.right))
                .cmp(&(canonical_key(&y.left), canonical_key(&y.right)))
        });
        return Err(AmbiguousMergeError { conflicts, merged }.into());
    }
    Ok(Reconciled { merged, added })
}

#[derive(Debug)]
struct Candidate {
    entry: AnnotationEntry,
    in_a: bool,
}

/// Fold entries sharing a native id into one candidate
///
/// Ids that name two different notes are reported and dropped entirely.
fn collapse_ids<'a>(
    entries: impl Iterator<Item = (&'a AnnotationEntry, bool)>,
    conflicts: &mut Vec<MergeConflict>,
) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    let mut by_id: FxHashMap<EntryId, usize> = FxHashMap::default();
    let mut reused: FxHashSet<EntryId> = FxHashSet::default();

    for (entry, in_a) in entries {
        if entry.id.is_derived() {
            out.push(Candidate {
                entry: entry.clone(),
                in_a,
            });
            continue;
        }
        match by_id.get(&entry.id) {
            None => {
                by_id.insert(entry.id.clone(), out.len());
                out.push(Candidate {
                    entry: entry.clone(),
                    in_a,
                });
            }
            Some(&idx) => {
                let existing = &mut out[idx];
                if same_note(&existing.entry, entry) {
                    existing.in_a |= in_a;
                    if kept_key(entry) < kept_key(&existing.entry) {
                        existing.entry = entry.clone();
                    }
                } else {
                    conflicts.push(conflict(ConflictReason::IdReused, &existing.entry, entry));
                    reused.insert(entry.id.clone());
                }
            }
        }
    }

    if !reused.is_empty() {
        out.retain(|c| !reused.contains(&c.entry.id));
    }
    out
}

/// Pick the kept instance, or report every divergent content text
fn resolve_bucket<'a>(
    bucket: &[&'a Candidate],
) -> std::result::Result<&'a AnnotationEntry, Vec<MergeConflict>> {
    let mut members: Vec<&'a AnnotationEntry> = bucket.iter().map(|c| &c.entry).collect();
    members.sort_by(|x, y| kept_key(x).cmp(&kept_key(y)));
    let kept = members[0];

    let mut seen_contents: FxHashSet<&str> = FxHashSet::default();
    seen_contents.insert(kept.content.as_str());
    let pairs: Vec<MergeConflict> = members[1..]
        .iter()
        .filter(|e| seen_contents.insert(e.content.as_str()))
        .map(|e| conflict(ConflictReason::ContentDiverges, kept, e))
        .collect();

    if pairs.is_empty() {
        Ok(kept)
    } else {
        Err(pairs)
    }
}

fn same_note(x: &AnnotationEntry, y: &AnnotationEntry) -> bool {
    let seconds_agree = match (x.created_second(), y.created_second()) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    };
    x.author == y.author && x.content == y.content && seconds_agree
}

fn conflict(reason: ConflictReason, x: &AnnotationEntry, y: &AnnotationEntry) -> MergeConflict {
    let (left, right) = if canonical_key(x) <= canonical_key(y) {
        (x, y)
    } else {
        (y, x)
    };
    MergeConflict {
        reason,
        left: left.clone(),
        right: right.clone(),
    }
}

fn content_key(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

type KeptKey<'a> = (bool, Origin, &'a EntryId, Option<Timestamp>, &'a str, &'a str);

fn kept_key(e: &AnnotationEntry) -> KeptKey<'_> {
    (
        e.created_at.is_none(),
        e.origin,
        &e.id,
        e.created_at,
        &e.author,
        &e.content,
    )
}

fn canonical_key(e: &AnnotationEntry) -> (Option<Timestamp>, &str, &str, &EntryId) {
    (e.created_at, &e.author, &e.content, &e.id)
}
