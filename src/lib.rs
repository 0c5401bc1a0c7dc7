//! Snapdb: Persistent File-Tree Snapshots
//!
//! A durable, path-indexed tree of file and folder records backed by an
//! embedded ordered key-value store. Supports point and prefix queries,
//! atomic subtree moves and deletes, session-buffered bulk loads, coalesced
//! streaming writes and whole-tree replacement from a live tree source.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::{DecodeError, SnapshotError, StorageError};
pub use snapshot::{
    AutoBatcher, BatchConfig, CaptureReport, EndpointInfo, SessionHandle, Snapshot,
    SnapshotOptions,
};
pub use source::{LocalSource, TreeSource};
pub use tree::{Node, NodeType};
