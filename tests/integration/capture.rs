use snapdb::source::WalkVisitor;
use snapdb::{LocalSource, Node, Snapshot, SnapshotError, TreeSource};
use std::fs;

use crate::integration::support::{all_paths, open_snapshot, seed};

/// Emits `fail_after` good entries out of `total`, then fails outright.
struct FailingSource {
    total: usize,
    fail_after: usize,
}

impl TreeSource for FailingSource {
    fn walk(&self, _root: &str, _recursive: bool, visit: &mut WalkVisitor<'_>) -> Result<(), SnapshotError> {
        for i in 0..self.total {
            if i == self.fail_after {
                return Err(SnapshotError::SourceWalk("connection reset".to_string()));
            }
            let key = format!("remote/{:02}", i);
            visit(&key, Ok(Node::leaf(key.as_str(), "e", 1, 1)));
        }
        Ok(())
    }
}

#[test]
fn failed_source_leaves_previous_state() {
    let (_temp, snapshot) = open_snapshot("atomic");
    seed(&snapshot, vec![Node::leaf("keep/me", "e", 1, 1)]);
    let before = all_paths(&snapshot);

    let source = FailingSource {
        total: 20,
        fail_after: 10,
    };
    let err = snapshot.capture(&source, &[]).unwrap_err();
    assert!(matches!(err, SnapshotError::SourceWalk(_)));
    assert_eq!(all_paths(&snapshot), before);
    assert!(snapshot.load_node("remote/00", false).unwrap_err().is_not_found());
}

#[test]
fn failed_first_capture_keeps_snapshot_empty() {
    let (_temp, snapshot) = open_snapshot("first");
    let source = FailingSource {
        total: 5,
        fail_after: 2,
    };
    assert!(snapshot.capture(&source, &[]).is_err());
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.entry_count(), 0);
}

#[test]
fn capture_local_directory() {
    let (temp, snapshot) = open_snapshot("local");
    let data = temp.path().join("data");
    fs::create_dir_all(data.join("docs/img")).unwrap();
    fs::write(data.join("docs/readme.md"), b"# hi").unwrap();
    fs::write(data.join("docs/img/logo.png"), b"png").unwrap();
    fs::write(data.join("top.txt"), b"top").unwrap();

    let report = snapshot.capture(&LocalSource::new(&data), &[]).unwrap();
    assert_eq!(report.captured, 5);
    assert_eq!(report.skipped, 0);
    assert_eq!(
        all_paths(&snapshot),
        vec!["docs", "docs/img", "docs/img/logo.png", "docs/readme.md", "top.txt"]
    );
    assert_eq!(snapshot.load_node("top.txt", false).unwrap().size, 3);
}

#[test]
fn capture_limited_to_paths() {
    let (temp, snapshot) = open_snapshot("paths");
    let data = temp.path().join("data");
    fs::create_dir_all(data.join("a")).unwrap();
    fs::create_dir_all(data.join("b")).unwrap();
    fs::write(data.join("a/1"), b"1").unwrap();
    fs::write(data.join("b/2"), b"2").unwrap();

    let source = LocalSource::new(&data).without_content_hash();
    let report = snapshot.capture(&source, &["a"]).unwrap();
    assert_eq!(report.captured, 1);
    assert_eq!(all_paths(&snapshot), vec!["a/1"]);
}

#[test]
fn snapshot_can_be_captured_from_another_snapshot() {
    let (_temp, origin) = open_snapshot("origin");
    seed(
        &origin,
        vec![Node::leaf("a/b", "e1", 2, 3), Node::leaf("c", "e2", 4, 5)],
    );

    let (_temp2, copy) = open_snapshot("copy");
    let report = copy.capture(&origin, &[]).unwrap();
    assert_eq!(report.captured, 3);
    assert_eq!(all_paths(&copy), all_paths(&origin));
    assert_eq!(copy.load_node("c", false).unwrap(), origin.load_node("c", false).unwrap());
}

#[test]
fn capture_replaces_open_snapshot_content_seen_after_reopen() {
    let (temp, snapshot) = open_snapshot("reopen");
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("only"), b"x").unwrap();

    seed(&snapshot, vec![Node::leaf("old", "e", 1, 1)]);
    snapshot.capture(&LocalSource::new(&data), &[]).unwrap();
    let folder = snapshot.folder_path().to_path_buf();
    snapshot.close(false).unwrap();

    let reopened = Snapshot::open(&folder, "reopen").unwrap();
    assert_eq!(all_paths(&reopened), vec!["only"]);
}
