//! Durability Tests
//!
//! WAL replay on reopen, torn-tail truncation, and durability modes.

use crate::*;
use std::fs::OpenOptions;
use std::io::Write;

const WAL_FILE: &str = "annotations.wal";

#[test]
fn test_reopen_restores_history() {
    let dir = tempfile::tempdir().unwrap();
    let before = {
        let db = Annolog::builder().path(dir.path()).strict().open().unwrap();
        db.append_annotation(42, Some("Kim"), "콜백 예정").unwrap();
        db.append_annotation(42, Some("Lee"), "미팅 거절").unwrap();
        db.import_legacy(7, "초기 상담 완료").unwrap();
        db.close().unwrap();
        (db.history(42), db.history(7))
    };

    let db = Annolog::open(dir.path()).unwrap();
    assert_eq!(db.history(42), before.0);
    assert_eq!(db.history(7), before.1);
    assert_eq!(db.version(42), 2);

    let stats = db.recovery_stats();
    assert_eq!(stats.commits_applied, 2);
    assert_eq!(stats.legacy_seeds, 1);
    assert!(!stats.has_issues());
}

#[test]
fn test_versions_continue_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Annolog::open(dir.path()).unwrap();
        db.append_annotation(1, Some("Kim"), "a").unwrap();
        db.close().unwrap();
    }
    let db = Annolog::open(dir.path()).unwrap();
    let result = db.append_annotation(1, Some("Kim"), "b").unwrap();
    assert_eq!(result.version, 2);
}

#[test]
fn test_migration_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Annolog::builder().path(dir.path()).strict().open().unwrap();
        db.import_legacy(7, "초기 상담 완료").unwrap();
        db.migrate(7).unwrap();
    }
    let db = Annolog::open(dir.path()).unwrap();
    let snapshot_entries = db.history(7);
    assert_eq!(snapshot_entries.len(), 1);
    assert_eq!(db.version(7), 1);
    // Already migrated: a second migration has nothing to do
    assert_eq!(db.migrate(7).unwrap().migrated, 0);
}

#[test]
fn test_torn_tail_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Annolog::builder().path(dir.path()).strict().open().unwrap();
        db.append_annotation(3, Some("Kim"), "a").unwrap();
        db.append_annotation(3, Some("Kim"), "b").unwrap();
    }
    let wal = dir.path().join(WAL_FILE);
    let intact_len = std::fs::metadata(&wal).unwrap().len();
    {
        let mut file = OpenOptions::new().append(true).open(&wal).unwrap();
        file.write_all(b"torn!").unwrap();
    }

    let db = Annolog::open(dir.path()).unwrap();
    assert_eq!(db.count(3), 2);
    assert_eq!(db.recovery_stats().bytes_truncated, 5);
    assert!(db.recovery_stats().has_issues());
    assert_eq!(std::fs::metadata(&wal).unwrap().len(), intact_len);

    // The log keeps working after truncation
    assert_eq!(db.append_annotation(3, Some("Kim"), "c").unwrap().version, 3);
}

#[test]
fn test_no_durability_writes_no_wal() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Annolog::builder()
            .path(dir.path())
            .no_durability()
            .open()
            .unwrap();
        db.append_annotation(1, Some("Kim"), "gone").unwrap();
    }
    assert!(!dir.path().join(WAL_FILE).exists());
    let db = Annolog::builder()
        .path(dir.path())
        .no_durability()
        .open()
        .unwrap();
    assert_eq!(db.count(1), 0);
}

#[test]
fn test_config_file_drives_open() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("annolog.toml");
    std::fs::write(
        &config_path,
        "durability = \"strict\"\ndefault_author = \"crm\"\n",
    )
    .unwrap();

    let config = EngineConfig::from_file(&config_path).unwrap();
    let db = Annolog::builder()
        .path(dir.path().join("data"))
        .config(config)
        .open()
        .unwrap();
    assert_eq!(db.durability_mode(), annolog::DurabilityMode::Strict);
    assert_eq!(db.append(1, None, "x").unwrap().author, "crm");
}

#[test]
fn test_ephemeral_has_no_path() {
    let db = create_db();
    assert!(db.is_ephemeral());
    assert!(db.path().is_none());
    db.flush().unwrap();
}

#[test]
fn test_second_open_of_same_directory_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let first = Annolog::builder().path(dir.path()).strict().open().unwrap();
    first.append_annotation(42, Some("Kim"), "콜백 예정").unwrap();

    let err = Annolog::builder().path(dir.path()).strict().open().unwrap_err();
    assert!(matches!(err, Error::Locked(_)));
    assert_eq!(err.code(), "DirectoryLockedError");

    first.append_annotation(42, Some("Lee"), "미팅 거절").unwrap();
    drop(first);

    // Every acknowledged append survives, none is rejected on replay
    let db = Annolog::open(dir.path()).unwrap();
    assert_eq!(db.count(42), 2);
    assert_eq!(db.version(42), 2);
    assert_eq!(db.recovery_stats().records_rejected, 0);
}

#[test]
fn test_waiting_open_serializes_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();
    let first = Annolog::builder().path(&path).strict().open().unwrap();
    first.append_annotation(5, Some("Kim"), "first").unwrap();

    let waiter = std::thread::spawn(move || {
        let db = Annolog::builder()
            .path(&path)
            .strict()
            .lock_wait(std::time::Duration::from_secs(10))
            .open()
            .unwrap();
        db.append_annotation(5, Some("Lee"), "second").unwrap()
    });
    std::thread::sleep(std::time::Duration::from_millis(50));
    drop(first);

    let result = waiter.join().unwrap();
    assert_eq!(result.version, 2);
    let db = Annolog::open(dir.path()).unwrap();
    let contents: Vec<_> = db.get_annotations(5).into_iter().map(|v| v.content).collect();
    assert_eq!(contents, vec!["first", "second"]);
}
