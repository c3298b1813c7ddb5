//! End-to-End Scenarios
//!
//! The reference walkthroughs for the annotation log: two sales reps writing
//! at once, legacy columns read back, and backup repair with and without
//! ambiguity.

use crate::*;
use annolog::{ConflictReason, LEGACY_AUTHOR};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn scenario_simultaneous_appends_both_land() {
    let db = Arc::new(create_db());
    for i in 0..3 {
        db.append_annotation(42, Some("Kim"), &format!("earlier {}", i)).unwrap();
    }
    assert_eq!(db.version(42), 3);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [("Kim", "콜백 예정"), ("Lee", "미팅 거절")]
        .into_iter()
        .map(|(author, content)| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.append_annotation(42, Some(author), content).unwrap()
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let views = db.get_annotations(42);
    assert_eq!(views.len(), 5);
    assert!(views.iter().any(|v| v.author == "Kim" && v.content == "콜백 예정"));
    assert!(views.iter().any(|v| v.author == "Lee" && v.content == "미팅 거절"));
    assert_eq!(db.version(42), 5);
}

#[test]
fn scenario_bare_string_legacy_column() {
    let db = create_db();
    db.import_legacy(7, "초기 상담 완료").unwrap();

    let views = db.get_annotations(7);
    assert_eq!(
        views,
        vec![AnnotationView {
            author: LEGACY_AUTHOR.to_string(),
            content: "초기 상담 완료".to_string(),
            created_at: None,
        }]
    );
    assert_eq!(
        serde_json::to_value(&views).unwrap(),
        json!([{ "author": "legacy", "content": "초기 상담 완료", "createdAt": null }])
    );
}

#[test]
fn scenario_writer_name_legacy_array() {
    let db = create_db();
    let column = r#"[{ "writer_name": "Park", "content": "후속 통화", "created_at": "2026-01-20T10:00:00Z" }]"#;
    db.import_legacy(8, column).unwrap();

    let views = db.get_annotations(8);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].author, "Park");
    assert_eq!(views[0].content, "후속 통화");
    assert_eq!(views[0].created_at, Some(at(0)));
}

#[test]
fn scenario_backup_with_overlap_repairs_two() {
    let db = create_db();
    db.repair_log(
        9,
        &json!([backup_entry("Kim", "콜백 예정", 0), backup_entry("Lee", "미팅 거절", 30)]),
    )
    .unwrap();
    assert_eq!(db.count(9), 2);
    let live = db.export_snapshot(9);

    // One overlapping note, written at the same second with sub-second noise
    let backup = json!([
        {"author": "Kim", "content": "콜백 예정", "created_at": "2026-01-20T10:00:00.420Z"},
        backup_entry("Park", "후속 통화", 60),
        backup_entry("Choi", "견적 발송", 90),
    ]);

    let offline = Annolog::reconcile(&live, &backup).unwrap();
    assert_eq!(offline.merged.len(), 4);
    assert_eq!(offline.added_count(), 2);

    let report = db.repair_log(9, &backup).unwrap();
    assert_eq!(report.added_count, 2);
    assert_eq!(report.merged_entries.len(), 4);
    assert_eq!(db.count(9), 4);
    assert_eq!(db.version(9), 4);
}

#[test]
fn scenario_divergent_key_needs_operator() {
    let db = create_db();
    db.repair_log(
        10,
        &json!([backup_entry("Kim", "콜백 예정", 0), backup_entry("Lee", "ok", 5)]),
    )
    .unwrap();
    let version = db.version(10);

    let backup = json!([
        backup_entry("Kim", "콜백  예정", 0),
        backup_entry("Park", "new", 10),
    ]);
    let err = db.repair_log(10, &backup).unwrap_err();

    match err {
        Error::AmbiguousMerge(merge) => {
            assert_eq!(merge.conflicts.len(), 1);
            let pair = &merge.conflicts[0];
            assert_eq!(pair.reason, ConflictReason::ContentDiverges);
            let contents = [pair.left.content.as_str(), pair.right.content.as_str()];
            assert!(contents.contains(&"콜백 예정"));
            assert!(contents.contains(&"콜백  예정"));
            // Clean keys are reported, the ambiguous one is withheld
            assert_eq!(merge.merged.len(), 2);
            assert!(merge.merged.iter().all(|e| e.author != "Kim"));
        }
        other => panic!("expected AmbiguousMerge, got {:?}", other),
    }
    // Nothing written, not even the clean addition
    assert_eq!(db.version(10), version);
    assert_eq!(db.count(10), 2);
}
