//! Concurrency Tests
//!
//! Many writers against one record: nothing lost, nothing duplicated,
//! and exhausted retries leave no partial writes.

use crate::*;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn contended_db(attempts: u32) -> Arc<Annolog> {
    Arc::new(
        Annolog::builder()
            .no_durability()
            .max_append_retries(attempts)
            .open_temp()
            .unwrap(),
    )
}

#[test]
fn test_no_lost_updates() {
    let db = contended_db(1_000);
    let threads = 8;
    let per_thread = 20;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    db.append_annotation(42, Some(&format!("writer-{}", t)), &format!("{}-{}", t, i))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let history = db.history(42);
    assert_eq!(history.len(), threads * per_thread);
    assert_eq!(db.version(42), (threads * per_thread) as u64);

    let contents: HashSet<_> = history.iter().map(|e| e.content.clone()).collect();
    assert_eq!(contents.len(), threads * per_thread);
    let ids: HashSet<_> = history.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), threads * per_thread);
}

#[test]
fn test_each_writer_sees_own_order() {
    let db = contended_db(1_000);
    let threads = 4;
    let per_thread = 15;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .map(|i| db.append_annotation(9, Some("w"), &format!("{}:{}", t, i)).unwrap().version)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all_versions = Vec::new();
    for h in handles {
        let versions = h.join().unwrap();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        all_versions.extend(versions);
    }
    // Every commit got a distinct version
    all_versions.sort_unstable();
    all_versions.dedup();
    assert_eq!(all_versions.len(), threads * per_thread);
}

#[test]
fn test_exhausted_retries_write_nothing() {
    let db = contended_db(1);
    let threads = 8;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ok = 0usize;
                for i in 0..per_thread {
                    match db.append_annotation(5, Some("w"), &format!("{}:{}", t, i)) {
                        Ok(_) => ok += 1,
                        Err(e) => {
                            assert_eq!(e.code(), "ConcurrentModificationError", "{:?}", e);
                            assert!(e.is_retryable());
                        }
                    }
                }
                ok
            })
        })
        .collect();

    let succeeded: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(succeeded >= 1);
    assert_eq!(db.count(5), succeeded);
    assert_eq!(db.version(5), succeeded as u64);

    let metrics = db.metrics().coordinator;
    assert_eq!(metrics.appends as usize, succeeded);
    assert_eq!(metrics.exhausted as usize, threads * per_thread - succeeded);
}

#[test]
fn test_concurrent_repair_and_append() {
    let db = contended_db(1_000);
    let backup = json!([
        backup_entry("Park", "a", 0),
        backup_entry("Park", "b", 1),
        backup_entry("Park", "c", 2),
    ]);
    let barrier = Arc::new(Barrier::new(2));

    let writer = {
        let db = Arc::clone(&db);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..20 {
                db.append_annotation(30, Some("Kim"), &format!("live {}", i)).unwrap();
            }
        })
    };
    let repairer = {
        let db = Arc::clone(&db);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            db.repair_log(30, &backup).unwrap().added_count
        })
    };

    writer.join().unwrap();
    assert_eq!(repairer.join().unwrap(), 3);
    assert_eq!(db.count(30), 23);
    assert_eq!(db.version(30), 23);
}

#[test]
fn test_concurrent_migrations_migrate_once() {
    let db = contended_db(1_000);
    db.import_legacy(7, "초기 상담 완료").unwrap();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.migrate(7).unwrap().migrated
            })
        })
        .collect();
    let migrated: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(migrated, 1);
    assert_eq!(db.count(7), 1);
    assert_eq!(db.version(7), 1);
}
