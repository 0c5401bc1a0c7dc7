//! Error types
//!
//! Two tiers: `StorageError` covers the embedded store and the on-disk record
//! format, `SnapshotError` is what the public snapshot surface returns.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to turn stored bytes back into a node.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty record")]
    Empty,

    #[error("unsupported record format version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed record: {0}")]
    Malformed(#[from] bincode::Error),
}

/// Errors raised by the store layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Timed out after {waited:?} waiting for the lock on {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Stored key is not valid UTF-8: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors returned by snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to open snapshot at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Node not found in snapshot: {0}")]
    NotFound(String),

    #[error("Invalid node path: {0:?}")]
    InvalidPath(String),

    #[error("Node already exists in snapshot: {0}")]
    AlreadyExists(String),

    #[error("Cannot move {from} to {to}: {reason}")]
    MoveConflict {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Operation not implemented by snapshot store: {0}")]
    NotImplemented(&'static str),

    #[error("Tree source walk failed: {0}")]
    SourceWalk(String),

    #[error("No session is active")]
    NoActiveSession,

    #[error("Session mismatch: active session is {expected}, got {actual}")]
    SessionMismatch { expected: String, actual: String },

    #[error("Auto-batch writer is no longer running")]
    BatcherClosed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DecodeError> for SnapshotError {
    fn from(err: DecodeError) -> Self {
        SnapshotError::Storage(StorageError::Decode(err))
    }
}

impl From<sled::Error> for SnapshotError {
    fn from(err: sled::Error) -> Self {
        SnapshotError::Storage(StorageError::Sled(err))
    }
}

impl From<config::ConfigError> for SnapshotError {
    fn from(err: config::ConfigError) -> Self {
        SnapshotError::ConfigError(err.to_string())
    }
}

impl SnapshotError {
    /// True when the error means the requested path is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::NotFound(_))
    }

    /// True when the stored bytes for a node could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, SnapshotError::Storage(StorageError::Decode(_)))
    }
}
