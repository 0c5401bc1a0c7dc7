use snapdb::snapshot::SnapshotOptions;
use snapdb::store::StoreOptions;
use snapdb::{Node, Snapshot, SnapshotError, StorageError};
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::support::{all_paths, open_snapshot, seed};

#[test]
fn new_snapshot_is_empty_and_reopened_one_is_not() {
    let temp = TempDir::new().unwrap();
    let snapshot = Snapshot::open(temp.path(), "persist").unwrap();
    assert!(snapshot.is_empty());
    seed(&snapshot, vec![Node::leaf("a/b.txt", "e", 4, 10)]);
    assert!(!snapshot.is_empty());
    snapshot.close(false).unwrap();

    let reopened = Snapshot::open(temp.path(), "persist").unwrap();
    assert!(!reopened.is_empty());
    assert_eq!(all_paths(&reopened), vec!["a", "a/b.txt"]);
    assert_eq!(reopened.load_node("a/b.txt", false).unwrap().mtime, 10);
}

#[test]
fn second_open_of_same_snapshot_times_out() {
    let temp = TempDir::new().unwrap();
    let _held = Snapshot::open(temp.path(), "locked").unwrap();
    let options = SnapshotOptions {
        store: StoreOptions {
            lock_timeout: Duration::from_millis(200),
            ..StoreOptions::default()
        },
        ..SnapshotOptions::default()
    };
    match Snapshot::open_with(temp.path(), "locked", &options) {
        Err(SnapshotError::Open {
            source: StorageError::LockTimeout { .. },
            ..
        }) => {}
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("store lock should be held"),
    }
}

#[test]
fn close_with_delete_removes_store_and_empty_folder() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("snapshots");
    let snapshot = Snapshot::open(&folder, "gone").unwrap();
    seed(&snapshot, vec![Node::leaf("x", "e", 1, 1)]);
    snapshot.close(true).unwrap();
    assert!(!folder.exists());
}

#[test]
fn close_with_delete_keeps_folder_shared_with_other_snapshots() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("snapshots");
    let keep = Snapshot::open(&folder, "keep").unwrap();
    let gone = Snapshot::open(&folder, "gone").unwrap();
    gone.close(true).unwrap();

    assert!(folder.exists());
    assert!(!Snapshot::store_path(&folder, "gone").exists());
    assert!(Snapshot::store_path(&folder, "keep").exists());
    keep.close(false).unwrap();
}

#[test]
fn close_commits_unfinished_session() {
    let temp = TempDir::new().unwrap();
    let snapshot = Snapshot::open(temp.path(), "late").unwrap();
    let session = snapshot.start_session(None, true);
    snapshot
        .create_node_in_session(&session, Node::leaf("pending.txt", "e", 1, 1), true)
        .unwrap();
    snapshot.close(false).unwrap();

    let reopened = Snapshot::open(temp.path(), "late").unwrap();
    assert!(reopened.load_node("pending.txt", false).is_ok());
}

#[test]
fn endpoint_info_and_unsupported_operations() {
    let (_temp, snapshot) = open_snapshot("endpoint");
    let info = snapshot.endpoint_info();
    assert_eq!(info.uri, "snapshot://endpoint");
    assert!(!info.requires_normalization);
    assert!(!info.requires_folders_rescan);

    assert!(matches!(
        snapshot.watch("/"),
        Err(SnapshotError::NotImplemented("watch"))
    ));
    let mut node = Node::leaf("a", "e", 1, 1);
    assert!(matches!(
        snapshot.compute_checksum(&mut node),
        Err(SnapshotError::NotImplemented(_))
    ));
}
