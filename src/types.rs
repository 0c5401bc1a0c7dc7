//! Core types shared across the snapshot store.

/// SessionId: opaque identifier handed out by `start_session`
pub type SessionId = String;

/// Timestamp: modification time in Unix seconds
pub type Timestamp = i64;

/// Name of the sled tree holding the live snapshot
pub const LIVE_BUCKET: &str = "snapshot";

/// Name of the sled tree used to stage a capture before it replaces the live tree
pub const CAPTURE_BUCKET: &str = "capture";

/// Prefix of the on-disk store directory inside the snapshot folder
pub const STORE_DIR_PREFIX: &str = "snapshot-";
