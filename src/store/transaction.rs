//! Read views and write transactions over the live tree.

use crate::error::StorageError;
use sled::IVec;
use std::collections::{BTreeMap, BTreeSet};

fn key_from_bytes(bytes: &[u8]) -> Result<String, StorageError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| StorageError::InvalidKey(String::from_utf8_lossy(bytes).into_owned()))
}

/// Read-only access to the last committed state of the live tree
pub struct ReadView<'a> {
    tree: &'a sled::Tree,
}

impl<'a> ReadView<'a> {
    pub(crate) fn new(tree: &'a sled::Tree) -> Self {
        Self { tree }
    }

    pub fn get(&self, key: &str) -> Result<Option<IVec>, StorageError> {
        Ok(self.tree.get(key.as_bytes())?)
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.tree.contains_key(key.as_bytes())?)
    }

    /// Ordered scan of every key starting with `prefix`. An empty prefix
    /// scans the whole tree.
    pub fn scan(
        &self,
        prefix: &str,
    ) -> impl Iterator<Item = Result<(String, IVec), StorageError>> + 'a {
        self.tree
            .scan_prefix(prefix.as_bytes())
            .map(|entry| -> Result<(String, IVec), StorageError> {
                let (key, value) = entry?;
                Ok((key_from_bytes(&key)?, value))
            })
    }
}

/// A read-write transaction.
///
/// Mutations are staged in an ordered overlay and applied to the tree as one
/// atomic batch when the enclosing closure succeeds. Reads see the committed
/// state with the transaction's own mutations layered on top.
pub struct WriteTxn<'a> {
    tree: &'a sled::Tree,
    overlay: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(tree: &'a sled::Tree) -> Self {
        Self {
            tree,
            overlay: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(staged) = self.overlay.get(key) {
            return Ok(staged.clone());
        }
        Ok(self.tree.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        if let Some(staged) = self.overlay.get(key) {
            return Ok(staged.is_some());
        }
        Ok(self.tree.contains_key(key.as_bytes())?)
    }

    pub fn insert(&mut self, key: &str, value: Vec<u8>) {
        self.overlay.insert(key.to_string(), Some(value));
    }

    pub fn remove(&mut self, key: &str) {
        self.overlay.insert(key.to_string(), None);
    }

    /// Keys starting with `prefix`, in ascending order, as this transaction
    /// currently sees them.
    pub fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = BTreeSet::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()).keys() {
            keys.insert(key_from_bytes(&entry?)?);
        }
        for (key, staged) in self.overlay.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match staged {
                Some(_) => keys.insert(key.clone()),
                None => keys.remove(key),
            };
        }
        Ok(keys.into_iter().collect())
    }

    pub(crate) fn into_batch(self) -> Option<sled::Batch> {
        if self.overlay.is_empty() {
            return None;
        }
        let mut batch = sled::Batch::default();
        for (key, staged) in self.overlay {
            match staged {
                Some(value) => batch.insert(key.as_bytes(), value),
                None => batch.remove(key.as_bytes()),
            }
        }
        Some(batch)
    }
}

/// Write access to the capture staging tree.
pub struct CaptureStage<'a> {
    tree: &'a sled::Tree,
}

impl<'a> CaptureStage<'a> {
    pub(crate) fn new(tree: &'a sled::Tree) -> Self {
        Self { tree }
    }

    pub fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.tree.insert(key.as_bytes(), value)?;
        Ok(())
    }
}
