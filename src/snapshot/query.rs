//! Query layer: point loads, prefix walks and recursive stats.

use super::Snapshot;
use crate::error::SnapshotError;
use crate::source::{TreeSource, WalkVisitor};
use crate::store::ReadView;
use crate::tree::node::{META_RECURSIVE_FILES, META_RECURSIVE_FOLDERS, META_RECURSIVE_SIZE};
use crate::tree::{codec, path, Node};
use tracing::debug;

/// Totals over every node below a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubtreeStats {
    files: i64,
    folders: i64,
    size: i64,
}

impl SubtreeStats {
    fn add(&mut self, node: &Node) {
        if node.is_leaf() {
            self.files += 1;
            self.size += node.size;
        } else {
            self.folders += 1;
        }
    }
}

impl Snapshot {
    /// Load the node at `path`.
    ///
    /// The root is synthesized and never read from the store. With
    /// `extended_stats` the node carries the recursive file count, folder
    /// count and byte size of its subtree as transient metadata; the node
    /// itself is not counted.
    pub fn load_node(&self, node_path: &str, extended_stats: bool) -> Result<Node, SnapshotError> {
        let key = path::normalize(node_path);
        if key.is_empty() {
            let mut root = Node::root();
            if extended_stats {
                let stats = self.store().with_read_view(|view| stats_below(view, &key))?;
                attach(&mut root, stats);
            }
            return Ok(root);
        }

        self.store().with_read_view(|view| -> Result<Node, SnapshotError> {
            let raw = view
                .get(&key)?
                .ok_or_else(|| SnapshotError::NotFound(key.clone()))?;
            let mut node = codec::decode(&raw)?;
            if extended_stats {
                attach(&mut node, stats_below(view, &key)?);
            }
            Ok(node)
        })
    }

    /// Nodes below `root`, in key order. Entries that fail to decode are
    /// left out.
    pub fn list(&self, root: &str, recursive: bool) -> Result<Vec<Node>, SnapshotError> {
        self.store()
            .with_read_view(|view| collect(view, root, recursive))
    }
}

impl TreeSource for Snapshot {
    fn walk(&self, root: &str, recursive: bool, visit: &mut WalkVisitor<'_>) -> Result<(), SnapshotError> {
        // visit outside the view so the visitor may write to this snapshot
        let nodes = self.list(root, recursive)?;
        for node in nodes {
            let key = node.path.clone();
            visit(&key, Ok(node));
        }
        Ok(())
    }
}

fn collect(view: &ReadView<'_>, root: &str, recursive: bool) -> Result<Vec<Node>, SnapshotError> {
    let prefix = path::child_prefix(root);
    let mut nodes = Vec::new();
    for entry in view.scan(&prefix) {
        let (key, raw) = entry?;
        if !recursive && !path::is_immediate_child(&key, &prefix) {
            continue;
        }
        match codec::decode(&raw) {
            Ok(node) => nodes.push(node),
            Err(e) => debug!(path = %key, error = %e, "Skipping undecodable entry"),
        }
    }
    Ok(nodes)
}

fn stats_below(view: &ReadView<'_>, key: &str) -> Result<SubtreeStats, SnapshotError> {
    let mut stats = SubtreeStats::default();
    for node in collect(view, key, true)? {
        stats.add(&node);
    }
    Ok(stats)
}

fn attach(node: &mut Node, stats: SubtreeStats) {
    node.set_meta(META_RECURSIVE_SIZE, stats.size);
    node.set_meta(META_RECURSIVE_FILES, stats.files);
    node.set_meta(META_RECURSIVE_FOLDERS, stats.folders);
}
