use snapdb::{Node, SnapshotError};

use crate::integration::support::{all_paths, open_snapshot, seed};

fn tree() -> Vec<Node> {
    vec![
        Node::collection("a", "c0", 1),
        Node::collection("a/b", "c1", 1),
        Node::leaf("a/b/c", "l0", 10, 1),
        Node::leaf("a/b2", "l1", 20, 1),
        Node::leaf("a/x", "l2", 30, 1),
    ]
}

#[test]
fn move_preserves_descendants() {
    let (_temp, snapshot) = open_snapshot("move");
    seed(
        &snapshot,
        vec![
            Node::collection("/a", "c0", 1),
            Node::collection("/a/b", "c1", 1),
            Node::leaf("/a/b/c", "l0", 10, 1),
        ],
    );
    snapshot.move_node("/a", "/z").unwrap();
    assert_eq!(all_paths(&snapshot), vec!["z", "z/b", "z/b/c"]);
    assert_eq!(snapshot.load_node("/z/b/c", false).unwrap().size, 10);
}

#[test]
fn delete_is_subtree_scoped() {
    let (_temp, snapshot) = open_snapshot("delete");
    seed(&snapshot, tree());
    snapshot.delete_node("/a/b").unwrap();
    // "a/b2" shares the byte prefix "a/b" but is a sibling
    assert_eq!(all_paths(&snapshot), vec!["a", "a/b2", "a/x"]);
}

#[test]
fn move_into_existing_subtree_is_rejected_without_changes() {
    let (_temp, snapshot) = open_snapshot("collide");
    seed(&snapshot, tree());
    let before = all_paths(&snapshot);

    let err = snapshot.move_node("a/b", "a/x").unwrap_err();
    assert!(matches!(err, SnapshotError::MoveConflict { .. }));
    let err = snapshot.move_node("a/x", "a").unwrap_err();
    assert!(matches!(err, SnapshotError::MoveConflict { .. }));
    assert_eq!(all_paths(&snapshot), before);
}

#[test]
fn rename_leaf_within_same_parent() {
    let (_temp, snapshot) = open_snapshot("rename");
    seed(&snapshot, tree());
    snapshot.move_node("a/x", "a/y").unwrap();
    let renamed = snapshot.load_node("a/y", false).unwrap();
    assert_eq!(renamed.path, "a/y");
    assert_eq!(renamed.etag, "l2");
    assert!(snapshot.load_node("a/x", false).unwrap_err().is_not_found());
}
