//! Repair Tests
//!
//! Backup reconciliation through the live store and offline.

use crate::*;
use annolog::{ConflictReason, LEGACY_AUTHOR};

#[test]
fn test_repair_from_empty_backup_is_noop() {
    let db = create_db();
    db.append_annotation(20, Some("Kim"), "a").unwrap();

    let report = db.repair_log(20, &json!([])).unwrap();
    assert_eq!(report.added_count, 0);
    assert_eq!(report.version, 1);
    assert_eq!(report.merged_entries.len(), 1);
}

#[test]
fn test_repair_restores_lost_record() {
    let db = create_db();
    let backup = json!([
        backup_entry("Kim", "a", 0),
        backup_entry("Lee", "b", 60),
    ]);

    let report = db.repair_log(21, &backup).unwrap();
    assert_eq!(report.added_count, 2);
    assert_eq!(report.version, 2);

    let views = db.get_annotations(21);
    assert_eq!(views[0].author, "Kim");
    assert_eq!(views[1].created_at, Some(at(60)));
}

#[test]
fn test_repair_twice_adds_nothing_second_time() {
    let db = create_db();
    db.append_annotation(22, Some("Kim"), "live").unwrap();
    let backup = json!([backup_entry("Park", "from backup", 0)]);

    assert_eq!(db.repair_log(22, &backup).unwrap().added_count, 1);
    let again = db.repair_log(22, &backup).unwrap();
    assert_eq!(again.added_count, 0);
    assert_eq!(db.count(22), 2);
    assert_eq!(db.version(22), 2);
}

#[test]
fn test_repair_accepts_legacy_shapes() {
    let db = create_db();
    // A bare string backup is a single legacy note
    let report = db.repair_log(23, &json!("초기 상담 완료")).unwrap();
    assert_eq!(report.added_count, 1);
    assert_eq!(db.get_annotations(23)[0].author, LEGACY_AUTHOR);
}

#[test]
fn test_repair_from_own_export_is_noop() {
    let db = create_db();
    db.append_annotation(24, Some("Kim"), "a").unwrap();
    db.append_annotation(24, Some("Lee"), "b").unwrap();
    let backup = db.export_snapshot(24);

    let report = db.repair_log(24, &backup).unwrap();
    assert_eq!(report.added_count, 0);
    assert_eq!(db.version(24), 2);
}

#[test]
fn test_whitespace_variant_is_ambiguous() {
    let db = create_db();
    let live = json!([backup_entry("Kim", "콜백 예정", 0)]);
    db.repair_log(25, &live).unwrap();

    let backup = json!([backup_entry("Kim", "콜백   예정", 0)]);
    let err = db.repair_log(25, &backup).unwrap_err();
    assert!(err.is_ambiguous_merge());
    assert_eq!(err.code(), "AmbiguousMergeError");
    assert_eq!(db.version(25), 1);
}

#[test]
fn test_reused_id_is_ambiguous() {
    let a = json!([{"id": "n-1", "author": "Kim", "content": "a", "created_at": "2026-01-20T10:00:00Z"}]);
    let b = json!([{"id": "n-1", "author": "Kim", "content": "b", "created_at": "2026-01-20T10:00:00Z"}]);

    match Annolog::reconcile(&a, &b) {
        Err(Error::AmbiguousMerge(err)) => {
            assert_eq!(err.conflicts.len(), 1);
            assert_eq!(err.conflicts[0].reason, ConflictReason::IdReused);
        }
        other => panic!("expected AmbiguousMerge, got {:?}", other),
    }
}

#[test]
fn test_offline_reconcile_is_commutative() {
    let a = json!([backup_entry("Kim", "a", 0), backup_entry("Lee", "b", 10)]);
    let b = json!([backup_entry("Lee", "b", 10), backup_entry("Park", "c", 20)]);

    let ab = Annolog::reconcile(&a, &b).unwrap();
    let ba = Annolog::reconcile(&b, &a).unwrap();
    assert_eq!(ab.merged, ba.merged);
    assert_eq!(ab.merged.len(), 3);
    assert_eq!(ab.added_count(), 1);
    assert_eq!(ba.added_count(), 1);
}

#[test]
fn test_sub_second_difference_still_merges() {
    let a = json!([{"author": "Kim", "content": "x", "created_at": "2026-01-20T10:00:00.100Z"}]);
    let b = json!([{"author": "Kim", "content": "x", "created_at": "2026-01-20T10:00:00.900Z"}]);

    let result = Annolog::reconcile(&a, &b).unwrap();
    assert_eq!(result.merged.len(), 1);
    assert_eq!(result.added_count(), 0);
}
