//! Durability and process-coordination tests
//!
//! Covers commit-per-mutation durability across reopen, the truncate flag,
//! storage-layer writer exclusion, and the lock-wait handover between two
//! writers.

use refsearch_core::{Error, Reference};
use refsearch_index::{IndexOptions, IndexStore, SearchIndex};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

fn titled(title: &str) -> Reference {
    Reference {
        id: Uuid::new_v4(),
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[test]
fn committed_state_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let a = titled("moraine vegetation");
    let b = titled("glacier dynamics");

    {
        let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
        index.add_or_update(&a).unwrap();
        index.add_or_update(&b).unwrap();
        index.close().unwrap();
    }

    let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
    assert_eq!(index.count(), 2);
    let hits: Vec<Uuid> = index.search("moraine", 0, 10).collect();
    assert_eq!(hits, vec![a.id]);
}

#[test]
fn drop_without_close_still_leaves_durable_state() {
    let tmp = tempfile::tempdir().unwrap();
    let a = titled("moraine vegetation");

    {
        // Every mutation commits before returning, so an abrupt drop loses
        // nothing.
        let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
        index.add_or_update(&a).unwrap();
    }

    let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
    assert_eq!(index.count(), 1);
}

#[test]
fn delete_is_durable() {
    let tmp = tempfile::tempdir().unwrap();
    let a = titled("moraine vegetation");
    let b = titled("glacier dynamics");

    {
        let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
        index.add_or_update(&a).unwrap();
        index.add_or_update(&b).unwrap();
        index.delete(a.id).unwrap();
        index.close().unwrap();
    }

    let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
    assert_eq!(index.count(), 1);
    assert_eq!(index.search("moraine", 0, 10).count(), 0);
    assert_eq!(index.search("glacier", 0, 10).count(), 1);
}

#[test]
fn truncate_discards_previous_state() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
        index.add_or_update(&titled("moraine vegetation")).unwrap();
        index.close().unwrap();
    }

    let options = IndexOptions {
        truncate: true,
        ..Default::default()
    };
    let index = SearchIndex::open_at(tmp.path(), options).unwrap();
    assert_eq!(index.count(), 0);
    assert_eq!(index.search("moraine", 0, 10).count(), 0);
}

#[test]
fn second_writer_is_rejected_while_open() {
    let tmp = tempfile::tempdir().unwrap();
    let _index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();

    let second = SearchIndex::open_at(tmp.path(), IndexOptions::default());
    assert!(matches!(second, Err(Error::StoreLocked { .. })));
}

#[test]
fn marker_present_while_open_gone_after_close() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(!IndexStore::lock_marker_present(tmp.path()));

    let index = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
    assert!(IndexStore::lock_marker_present(tmp.path()));

    index.close().unwrap();
    assert!(!IndexStore::lock_marker_present(tmp.path()));
}

#[test]
fn lock_wait_hands_over_from_closing_writer() {
    let tmp = tempfile::tempdir().unwrap();
    let first = SearchIndex::open_at(tmp.path(), IndexOptions::default()).unwrap();
    first.add_or_update(&titled("moraine vegetation")).unwrap();

    let closer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        first.close().unwrap();
    });

    // Polls the marker until the first writer releases, well inside the
    // ~5 second budget, then opens and sees the committed state.
    let options = IndexOptions {
        wait_for_lock: true,
        ..Default::default()
    };
    let second = SearchIndex::open_at(tmp.path(), options).unwrap();
    assert_eq!(second.count(), 1);

    closer.join().unwrap();
    second.close().unwrap();
}
