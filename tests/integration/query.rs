use snapdb::tree::node::{META_RECURSIVE_FILES, META_RECURSIVE_FOLDERS, META_RECURSIVE_SIZE};
use snapdb::{Node, TreeSource};

use crate::integration::support::{open_snapshot, seed};

#[test]
fn extended_stats_over_subtree() {
    let (_temp, snapshot) = open_snapshot("stats");
    seed(
        &snapshot,
        vec![
            Node::collection("p", "c", 1),
            Node::leaf("p/a", "e", 100, 1),
            Node::collection("p/sub", "c", 1),
            Node::leaf("p/sub/b", "e", 200, 1),
            Node::leaf("other", "e", 999, 1),
        ],
    );

    let p = snapshot.load_node("/p", true).unwrap();
    assert_eq!(p.meta_i64(META_RECURSIVE_SIZE), Some(300));
    assert_eq!(p.meta_i64(META_RECURSIVE_FILES), Some(2));
    assert_eq!(p.meta_i64(META_RECURSIVE_FOLDERS), Some(1));

    // stats are not persisted
    assert!(snapshot.load_node("/p", false).unwrap().metadata.is_empty());
}

#[test]
fn root_load_never_fails() {
    let (_temp, snapshot) = open_snapshot("root");
    for root in ["/", "", "//"] {
        let node = snapshot.load_node(root, false).unwrap();
        assert_eq!(node.path, "/");
    }
    assert_eq!(snapshot.entry_count(), 0);
}

#[test]
fn missing_node_is_not_found() {
    let (_temp, snapshot) = open_snapshot("missing");
    assert!(snapshot.load_node("nope", false).unwrap_err().is_not_found());
}

#[test]
fn walk_recursive_and_immediate() {
    let (_temp, snapshot) = open_snapshot("walk");
    seed(
        &snapshot,
        vec![
            Node::leaf("d/a", "e", 1, 1),
            Node::leaf("d/e/f", "e", 1, 1),
            Node::leaf("dz", "e", 1, 1),
        ],
    );

    let mut immediate = Vec::new();
    snapshot
        .walk("/d", false, &mut |key, _| immediate.push(key.to_string()))
        .unwrap();
    assert_eq!(immediate, vec!["d/a", "d/e"]);

    let mut recursive = Vec::new();
    snapshot
        .walk("d/", true, &mut |key, _| recursive.push(key.to_string()))
        .unwrap();
    assert_eq!(recursive, vec!["d/a", "d/e", "d/e/f"]);
}
