//! Subtree mutations: recursive delete and move/rename.
//!
//! Both run as a single write transaction, so readers see either the old
//! subtree or the new one.

use super::Snapshot;
use crate::error::SnapshotError;
use crate::store::WriteTxn;
use crate::tree::{codec, path, Node};
use tracing::debug;

impl Snapshot {
    /// Remove the node at `path` and everything below it. Deleting a missing
    /// path or the root is a no-op.
    pub fn delete_node(&self, node_path: &str) -> Result<(), SnapshotError> {
        let key = path::normalize(node_path);
        if key.is_empty() {
            return Ok(());
        }

        let removed = self.store().with_read_write(|txn| -> Result<usize, SnapshotError> {
            if !txn.contains(&key)? {
                return Ok(0);
            }
            let descendants = txn.scan_keys(&path::child_prefix(&key))?;
            txn.remove(&key);
            for child in &descendants {
                txn.remove(child);
            }
            Ok(descendants.len() + 1)
        })?;

        if removed > 0 {
            debug!(path = %key, removed, "Deleted subtree");
        }
        Ok(())
    }

    /// Re-key the node at `old_path` and its whole subtree under `new_path`.
    ///
    /// The destination must not exist yet and must not lie inside the moved
    /// subtree. Missing destination ancestors get placeholders. Moving a
    /// missing source is a no-op.
    pub fn move_node(&self, old_path: &str, new_path: &str) -> Result<(), SnapshotError> {
        let from = path::normalize(old_path);
        let to = path::normalize(new_path);
        if from.is_empty() {
            return Err(SnapshotError::InvalidPath(old_path.to_string()));
        }
        if to.is_empty() {
            return Err(SnapshotError::InvalidPath(new_path.to_string()));
        }
        if from == to {
            return Ok(());
        }

        let moved = self
            .store()
            .with_read_write(|txn| -> Result<usize, SnapshotError> {
                if !txn.contains(&from)? {
                    return Ok(0);
                }
                if path::is_within(&to, &from) {
                    return Err(conflict(&from, &to, "destination is inside the source subtree"));
                }
                if txn.contains(&to)? {
                    return Err(conflict(&from, &to, "destination already exists"));
                }
                if !txn.scan_keys(&path::child_prefix(&to))?.is_empty() {
                    return Err(conflict(&from, &to, "destination has children"));
                }

                let mut keys = vec![from.clone()];
                keys.extend(txn.scan_keys(&path::child_prefix(&from))?);

                let mut moved = Vec::with_capacity(keys.len());
                for key in &keys {
                    let raw = txn
                        .get(key)?
                        .ok_or_else(|| SnapshotError::NotFound(key.clone()))?;
                    let target = path::rebase(key, &from, &to);
                    moved.push(codec::decode(&raw)?.with_path(target));
                }
                for key in &keys {
                    txn.remove(key);
                }
                for node in &moved {
                    txn.insert(&node.path, codec::encode(node)?);
                }
                materialize_ancestors(txn, &to)?;
                Ok(moved.len())
            })?;

        if moved > 0 {
            debug!(from = %from, to = %to, moved, "Moved subtree");
        }
        Ok(())
    }
}

fn conflict(from: &str, to: &str, reason: &str) -> SnapshotError {
    SnapshotError::MoveConflict {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    }
}

fn materialize_ancestors(txn: &mut WriteTxn<'_>, key: &str) -> Result<(), SnapshotError> {
    for ancestor in path::ancestors(key) {
        if !txn.contains(&ancestor)? {
            let placeholder = Node::placeholder(ancestor.clone());
            txn.insert(&ancestor, codec::encode(&placeholder)?);
        }
    }
    Ok(())
}
