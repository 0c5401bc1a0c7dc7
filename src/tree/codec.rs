//! Node record codec
//!
//! Records are a one-byte format version followed by a bincode body. The
//! transient metadata map is not part of the body.

use crate::error::{DecodeError, StorageError};
use crate::tree::node::{Node, NodeType};
use crate::types::Timestamp;
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current on-disk record version
pub const FORMAT_VERSION: u8 = 1;

/// Upper bound on a decoded record body
const MAX_RECORD_BYTES: u64 = 1 << 20;

#[derive(Serialize)]
struct StoredNodeRef<'a> {
    path: &'a str,
    node_type: NodeType,
    etag: &'a str,
    mtime: Timestamp,
    size: i64,
}

#[derive(Deserialize)]
struct StoredNode {
    path: String,
    node_type: NodeType,
    etag: String,
    mtime: Timestamp,
    size: i64,
}

fn options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_RECORD_BYTES)
}

/// Encode a node for storage.
pub fn encode(node: &Node) -> Result<Vec<u8>, StorageError> {
    let stored = StoredNodeRef {
        path: &node.path,
        node_type: node.node_type,
        etag: &node.etag,
        mtime: node.mtime,
        size: node.size,
    };
    let body = options()
        .serialize(&stored)
        .map_err(|e| StorageError::Encode(format!("{} ({})", e, node.path)))?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a stored record.
pub fn decode(bytes: &[u8]) -> Result<Node, DecodeError> {
    let (version, body) = bytes.split_first().ok_or(DecodeError::Empty)?;
    if *version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(*version));
    }
    let stored: StoredNode = options().deserialize(body)?;
    Ok(Node {
        path: stored.path,
        node_type: stored.node_type,
        etag: stored.etag,
        mtime: stored.mtime,
        size: stored.size,
        metadata: BTreeMap::new(),
    })
}
