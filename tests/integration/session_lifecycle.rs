use snapdb::{Node, NodeType, SnapshotError};

use crate::integration::support::{all_paths, open_snapshot};

#[test]
fn flush_materializes_all_implied_ancestors() {
    let (_temp, snapshot) = open_snapshot("session");
    let session = snapshot.start_session(Some(&Node::root()), false);
    assert_eq!(session.root, "/");

    for (i, path) in ["x/y/one", "x/y/two", "x/z/three"].iter().enumerate() {
        snapshot
            .create_node_in_session(&session, Node::leaf(*path, "e", i as i64, 1), true)
            .unwrap();
    }
    assert_eq!(snapshot.entry_count(), 0);

    snapshot.flush_session(&session.uuid).unwrap();
    assert_eq!(
        all_paths(&snapshot),
        vec!["x", "x/y", "x/y/one", "x/y/two", "x/z", "x/z/three"]
    );
    for dir in ["x", "x/y", "x/z"] {
        assert_eq!(snapshot.load_node(dir, false).unwrap().node_type, NodeType::Collection);
    }

    // a second flush has nothing to write
    snapshot.flush_session(&session.uuid).unwrap();
    assert_eq!(snapshot.entry_count(), 6);
}

#[test]
fn session_reuses_committed_ancestors() {
    let (_temp, snapshot) = open_snapshot("ancestors");
    let first = snapshot.start_session(None, true);
    snapshot
        .create_node_in_session(&first, Node::collection("docs", "real", 5), true)
        .unwrap();
    snapshot.finish_session(&first.uuid).unwrap();

    let second = snapshot.start_session(None, true);
    snapshot
        .create_node_in_session(&second, Node::leaf("docs/a.md", "e", 1, 1), true)
        .unwrap();
    snapshot.finish_session(&second.uuid).unwrap();

    // the committed collection is not overwritten by a placeholder
    assert_eq!(snapshot.load_node("docs", false).unwrap().etag, "real");
}

#[test]
fn finish_ends_the_session() {
    let (_temp, snapshot) = open_snapshot("finish");
    let session = snapshot.start_session(None, true);
    snapshot.finish_session(&session.uuid).unwrap();
    assert!(snapshot.active_session().is_none());
    assert!(matches!(
        snapshot.finish_session(&session.uuid),
        Err(SnapshotError::NoActiveSession)
    ));
    assert!(matches!(
        snapshot.create_node_in_session(&session, Node::leaf("a", "e", 1, 1), true),
        Err(SnapshotError::NoActiveSession)
    ));
}

#[test]
fn session_without_update_rejects_committed_node() {
    let (_temp, snapshot) = open_snapshot("reject");
    let session = snapshot.start_session(None, true);
    snapshot
        .create_node_in_session(&session, Node::leaf("f", "e1", 1, 1), false)
        .unwrap();
    snapshot.flush_session(&session.uuid).unwrap();

    let err = snapshot
        .create_node_in_session(&session, Node::leaf("f", "e2", 1, 2), false)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::AlreadyExists(ref p) if p == "f"));
}

#[test]
fn empty_path_segments_never_become_keys() {
    let (_temp, snapshot) = open_snapshot("segments");
    let session = snapshot.start_session(None, true);
    snapshot
        .create_node_in_session(&session, Node::leaf("a//b", "e", 1, 1), true)
        .unwrap();
    snapshot.finish_session(&session.uuid).unwrap();

    snapshot.create_node(Node::leaf("/c///d/", "e", 2, 1), true).unwrap();
    snapshot.flush_pending().unwrap();

    assert_eq!(all_paths(&snapshot), vec!["a", "a/b", "c", "c/d"]);
    assert_eq!(snapshot.load_node("a//b", false).unwrap().path, "a/b");
    let children: Vec<String> = snapshot
        .list("a", false)
        .unwrap()
        .into_iter()
        .map(|n| n.path)
        .collect();
    assert_eq!(children, vec!["a/b"]);
}
