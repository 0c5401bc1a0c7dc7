//! Snapshot node types

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Etag given to collections synthesized for missing ancestors
pub const PLACEHOLDER_ETAG: &str = "-1";

/// Transient metadata key: sum of leaf sizes below a node
pub const META_RECURSIVE_SIZE: &str = "recursive_children_size";
/// Transient metadata key: number of leaves below a node
pub const META_RECURSIVE_FILES: &str = "recursive_children_files";
/// Transient metadata key: number of collections below a node
pub const META_RECURSIVE_FOLDERS: &str = "recursive_children_folders";

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Leaf,
    Collection,
}

/// One file or folder record of a snapshot.
///
/// `metadata` is a side map for values computed at query time. It is never
/// written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    pub node_type: NodeType,
    pub etag: String,
    pub mtime: Timestamp,
    pub size: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Node {
    pub fn leaf(path: impl Into<String>, etag: impl Into<String>, size: i64, mtime: Timestamp) -> Self {
        Self {
            path: path.into(),
            node_type: NodeType::Leaf,
            etag: etag.into(),
            mtime,
            size,
            metadata: BTreeMap::new(),
        }
    }

    pub fn collection(path: impl Into<String>, etag: impl Into<String>, mtime: Timestamp) -> Self {
        Self {
            path: path.into(),
            node_type: NodeType::Collection,
            etag: etag.into(),
            mtime,
            size: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Collection standing in for an ancestor nobody created explicitly.
    pub fn placeholder(path: impl Into<String>) -> Self {
        Self::collection(path, PLACEHOLDER_ETAG, 0)
    }

    /// The synthetic root record. Never persisted.
    pub fn root() -> Self {
        Self::collection("/", "", 0)
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type == NodeType::Leaf
    }

    pub fn is_placeholder(&self) -> bool {
        self.node_type == NodeType::Collection && self.etag == PLACEHOLDER_ETAG
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Integer metadata lookup, used for the recursive stats keys.
    pub fn meta_i64(&self, key: &str) -> Option<i64> {
        self.metadata.get(key).and_then(|v| v.as_i64())
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}
