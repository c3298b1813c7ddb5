//! History Tests
//!
//! Ordering, legacy normalization on read, and migration.

use crate::*;
use annolog::LEGACY_AUTHOR;

#[test]
fn test_empty_record_has_empty_history() {
    let db = create_db();
    assert!(db.get_annotations(99).is_empty());
    assert_eq!(db.count(99), 0);
    assert_eq!(db.export_snapshot(99), json!([]));
}

#[test]
fn test_history_in_append_order() {
    let db = create_db();
    for i in 0..5 {
        db.append_annotation(4, Some("Kim"), &format!("note {}", i)).unwrap();
    }
    let contents: Vec<_> = db.history(4).into_iter().map(|e| e.content).collect();
    assert_eq!(contents, vec!["note 0", "note 1", "note 2", "note 3", "note 4"]);
}

#[test]
fn test_legacy_array_sorted_with_nulls_first() {
    let db = create_db();
    let column = json!([
        {"author": "B", "content": "later", "created_at": "2026-01-20T12:00:00Z"},
        {"author": "A", "content": "earlier", "created_at": "2026-01-20T10:00:00Z"},
        {"author": "C", "content": "undated one"},
        {"author": "D", "content": "undated two"},
    ])
    .to_string();
    db.import_legacy(11, &column).unwrap();

    let contents: Vec<_> = db
        .get_annotations(11)
        .into_iter()
        .map(|v| v.content)
        .collect();
    // Undated entries keep their stored order ahead of dated ones
    assert_eq!(contents, vec!["undated one", "undated two", "earlier", "later"]);
}

#[test]
fn test_malformed_fragments_dropped_not_fatal() {
    let db = create_db();
    let column = json!([
        {"author": "Park", "content": "kept"},
        [1, 2],
        {"author": "Park"},
        null,
    ])
    .to_string();
    db.import_legacy(12, &column).unwrap();

    let views = db.get_annotations(12);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].content, "kept");
}

#[test]
fn test_legacy_read_is_stable() {
    let db = create_db();
    db.import_legacy(13, "초기 상담 완료").unwrap();

    let first = db.history(13);
    let second = db.history(13);
    assert_eq!(first, second);
    assert_eq!(first[0].origin, Origin::Legacy);
    assert!(first[0].id.is_derived());
}

#[test]
fn test_import_into_used_record_rejected() {
    let db = create_db();
    db.append_annotation(14, Some("Kim"), "native").unwrap();
    let err = db.import_legacy(14, "legacy text").unwrap_err();
    assert!(err.is_validation());

    assert!(!db.import_legacy(15, "   ").unwrap());
    assert!(db.parents().iter().all(|p| *p != ParentId::new(15)));
}

#[test]
fn test_migrate_moves_legacy_into_log() {
    let db = create_db();
    let column = json!([
        {"writer_name": "Park", "content": "a", "created_at": "2026-01-20T10:00:00Z"},
        {"writer_name": "Park", "content": "b", "created_at": "2026-01-20T11:00:00Z"},
    ])
    .to_string();
    db.import_legacy(16, &column).unwrap();
    let before = db.history(16);

    let report = db.migrate(16).unwrap();
    assert_eq!(report.migrated, 2);
    assert_eq!(report.version, 2);
    assert_eq!(db.history(16), before);

    // Nothing left to migrate
    let again = db.migrate(16).unwrap();
    assert_eq!(again.migrated, 0);
    assert_eq!(again.version, 2);
}

#[test]
fn test_append_after_legacy_keeps_old_notes() {
    let db = create_db();
    db.import_legacy(17, "초기 상담 완료").unwrap();

    db.append_annotation(17, Some("Kim"), "후속").unwrap();

    let views = db.get_annotations(17);
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].author, LEGACY_AUTHOR);
    assert_eq!(views[1].content, "후속");
}

#[test]
fn test_export_snapshot_round_trips_through_normalize() {
    let db = create_db();
    db.append_annotation(18, Some("Kim"), "a").unwrap();
    db.append_annotation(18, Some("Lee"), "b").unwrap();

    let snapshot = db.export_snapshot(18);
    assert_eq!(annolog::normalize(&snapshot), db.history(18));
}
