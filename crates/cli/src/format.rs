//! JSON rendering of command results and errors.

use annolog::{AnnotationEntry, Error, MigrationReport, Reconciled, RepairReport};
use annolog_wire::encode_entries;
use serde_json::{json, Value};

pub fn format_repair(report: &RepairReport) -> Value {
    json!({
        "addedCount": report.added_count,
        "version": report.version,
        "merged": encode_entries(&report.merged_entries),
    })
}

pub fn format_migration(report: &MigrationReport) -> Value {
    json!({
        "migrated": report.migrated,
        "version": report.version,
    })
}

pub fn format_reconciled(result: &Reconciled) -> Value {
    json!({
        "addedCount": result.added_count(),
        "merged": encode_entries(&result.merged),
        "added": encode_entries(&result.added),
    })
}

fn pair(left: &AnnotationEntry, right: &AnnotationEntry) -> Value {
    encode_entries(&[left.clone(), right.clone()])
}

/// Error body written to stderr: `{code, message}` plus merge details.
pub fn format_error(err: &Error) -> Value {
    let mut body = json!({
        "code": err.code(),
        "message": err.to_string(),
    });
    if let Error::AmbiguousMerge(merge) = err {
        body["conflicts"] = merge
            .conflicts
            .iter()
            .map(|c| {
                json!({
                    "reason": c.reason.to_string(),
                    "entries": pair(&c.left, &c.right),
                })
            })
            .collect();
        body["merged"] = encode_entries(&merge.merged);
    }
    body
}

/// Process exit status for a failed command.
pub fn exit_code(err: &Error) -> i32 {
    if err.is_ambiguous_merge() {
        2
    } else {
        1
    }
}
