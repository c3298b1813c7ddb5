//! Append Tests
//!
//! Validation, author fallback, and version accounting for single appends.

use crate::*;

#[test]
fn test_append_returns_id_and_version() {
    let db = create_db();

    let first = db.append_annotation(42, Some("Kim"), "콜백 예정").unwrap();
    let second = db.append_annotation(42, Some("Lee"), "미팅 거절").unwrap();

    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_ne!(first.entry_id, second.entry_id);
    assert_eq!(db.version(42), 2);
}

#[test]
fn test_append_result_serializes_camel_case() {
    let db = create_db();
    let result = db.append_annotation(1, Some("Kim"), "hello").unwrap();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["entryId"], result.entry_id.as_str());
}

#[test]
fn test_blank_content_is_validation_error() {
    let db = create_db();

    for content in ["", "   ", "\n\t"] {
        let err = db.append_annotation(5, Some("Kim"), content).unwrap_err();
        assert!(err.is_validation(), "{:?}", err);
        assert_eq!(err.code(), "ValidationError");
    }
    assert_eq!(db.version(5), 0);
    assert!(db.parents().is_empty());
}

#[test]
fn test_missing_author_uses_default() {
    let db = Annolog::builder()
        .no_durability()
        .default_author("crm")
        .open_temp()
        .unwrap();

    let none = db.append(3, None, "a").unwrap();
    let blank = db.append(3, Some("  "), "b").unwrap();
    let padded = db.append(3, Some(" Kim "), "c").unwrap();

    assert_eq!(none.author, "crm");
    assert_eq!(blank.author, "crm");
    assert_eq!(padded.author, "Kim");
}

#[test]
fn test_content_stored_verbatim() {
    let db = create_db();
    let entry = db.append(3, Some("Kim"), "  두 줄\n메모  ").unwrap();
    assert_eq!(entry.content, "  두 줄\n메모  ");
    assert_eq!(db.history(3)[0].content, "  두 줄\n메모  ");
}

#[test]
fn test_appended_entries_are_native_and_timestamped() {
    let db = create_db();
    let entry = db.append(8, Some("Kim"), "x").unwrap();
    assert_eq!(entry.origin, Origin::Native);
    assert!(entry.created_at.is_some());
    assert!(!entry.id.is_derived());
}

#[test]
fn test_records_are_independent() {
    let db = create_db();
    db.append_annotation(1, Some("Kim"), "a").unwrap();
    db.append_annotation(2, Some("Kim"), "b").unwrap();
    db.append_annotation(2, Some("Kim"), "c").unwrap();

    assert_eq!(db.version(1), 1);
    assert_eq!(db.version(2), 2);
    assert_eq!(db.parents(), vec![ParentId::new(1), ParentId::new(2)]);
}

#[test]
fn test_metrics_count_appends() {
    let db = create_db();
    db.append_annotation(1, Some("Kim"), "a").unwrap();
    db.append_annotation(1, Some("Kim"), "b").unwrap();
    let _ = db.append_annotation(1, Some("Kim"), " ");

    let metrics = db.metrics();
    assert_eq!(metrics.records, 1);
    assert_eq!(metrics.commits, 2);
    assert_eq!(metrics.coordinator.appends, 2);
}
