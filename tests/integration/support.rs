use snapdb::{Node, Snapshot};
use tempfile::TempDir;

/// A fresh snapshot in its own temporary folder.
pub fn open_snapshot(name: &str) -> (TempDir, Snapshot) {
    let temp = TempDir::new().unwrap();
    let snapshot = Snapshot::open(temp.path().join("snapshots"), name).unwrap();
    (temp, snapshot)
}

/// Load `nodes` through a session and finish it.
pub fn seed(snapshot: &Snapshot, nodes: Vec<Node>) {
    let session = snapshot.start_session(None, true);
    for node in nodes {
        snapshot.create_node_in_session(&session, node, true).unwrap();
    }
    snapshot.finish_session(&session.uuid).unwrap();
}

pub fn all_paths(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .list("/", true)
        .unwrap()
        .into_iter()
        .map(|n| n.path)
        .collect()
}
