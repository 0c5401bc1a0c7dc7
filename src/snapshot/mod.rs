//! Snapshot
//!
//! A named, file-backed tree of nodes indexed by path. Writes reach the store
//! through one of two paths chosen by the caller:
//!
//! - `create_node` streams through the auto-batching writer and becomes
//!   visible after the next batch flush.
//! - `create_node_in_session` stages into the active session buffer and
//!   becomes visible on `flush_session` / `finish_session`.
//!
//! Reads, subtree moves and deletes, and captures go to the store directly.

pub mod batcher;
pub mod capture;
pub mod query;
pub mod session;
pub mod subtree;

pub use batcher::{AutoBatcher, BatchConfig};
pub use capture::CaptureReport;
pub use session::SessionHandle;

use crate::config::SnapdbConfig;
use crate::error::{SnapshotError, StorageError};
use crate::store::{ReadView, Store, StoreOptions};
use crate::tree::{codec, path, Node};
use crate::types::STORE_DIR_PREFIX;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use session::SessionBuffer;

/// Everything needed to open a snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    pub store: StoreOptions,
    pub batch: BatchConfig,
}

impl From<&SnapdbConfig> for SnapshotOptions {
    fn from(config: &SnapdbConfig) -> Self {
        Self {
            store: config.storage.store_options(),
            batch: config.batch.clone(),
        }
    }
}

/// How the snapshot presents itself to a sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub uri: String,
    pub requires_normalization: bool,
    pub requires_folders_rescan: bool,
}

/// A persisted file-tree snapshot
pub struct Snapshot {
    name: String,
    folder_path: PathBuf,
    store: Arc<Store>,
    empty: AtomicBool,
    session: Mutex<Option<SessionBuffer>>,
    batcher: AutoBatcher,
}

impl Snapshot {
    /// Open the snapshot `name` in `folder_path` with default options.
    pub fn open(folder_path: impl AsRef<Path>, name: &str) -> Result<Self, SnapshotError> {
        Self::open_with(folder_path, name, &SnapshotOptions::default())
    }

    /// Open (creating if needed) the snapshot `name` in `folder_path`.
    ///
    /// A snapshot whose store did not exist before this call starts out
    /// empty.
    pub fn open_with(
        folder_path: impl AsRef<Path>,
        name: &str,
        options: &SnapshotOptions,
    ) -> Result<Self, SnapshotError> {
        let folder_path = folder_path.as_ref().to_path_buf();
        let store_path = Self::store_path(&folder_path, name);

        std::fs::create_dir_all(&folder_path).map_err(|e| SnapshotError::Open {
            path: folder_path.clone(),
            source: StorageError::IoError(e),
        })?;
        let empty = !store_path.exists();

        let store = Store::open(&store_path, &options.store).map_err(|source| {
            SnapshotError::Open {
                path: store_path.clone(),
                source,
            }
        })?;
        let store = Arc::new(store);
        let batcher = AutoBatcher::spawn(Arc::clone(&store), options.batch.clone())?;

        info!(name = %name, path = %store_path.display(), empty, "Opened snapshot");

        Ok(Self {
            name: name.to_string(),
            folder_path,
            store,
            empty: AtomicBool::new(empty),
            session: Mutex::new(None),
            batcher,
        })
    }

    /// Location of the store for `name` inside `folder_path`.
    pub fn store_path(folder_path: &Path, name: &str) -> PathBuf {
        folder_path.join(format!("{}{}", STORE_DIR_PREFIX, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder_path(&self) -> &Path {
        &self.folder_path
    }

    /// True until a capture or a session has completed on a fresh store.
    pub fn is_empty(&self) -> bool {
        self.empty.load(Ordering::SeqCst)
    }

    /// Number of committed nodes.
    pub fn entry_count(&self) -> usize {
        self.store.len()
    }

    pub fn endpoint_info(&self) -> EndpointInfo {
        EndpointInfo {
            uri: format!("snapshot://{}", self.name),
            requires_normalization: false,
            requires_folders_rescan: false,
        }
    }

    /// Queue `node` for the auto-batching writer, together with a placeholder
    /// for each ancestor collection missing from the store.
    ///
    /// With `update_if_exists == false` a path already holding a real node
    /// is rejected with `AlreadyExists`.
    pub fn create_node(&self, node: Node, update_if_exists: bool) -> Result<(), SnapshotError> {
        let node = normalized(node)?;
        // pushes happen outside the read view: a flush waits for readers
        let missing = self.store.with_read_view(|view| -> Result<_, SnapshotError> {
            if !update_if_exists && is_occupied(view, &node.path)? {
                return Err(SnapshotError::AlreadyExists(node.path.clone()));
            }
            let mut missing = Vec::new();
            for ancestor in path::ancestors(&node.path) {
                if !view.contains(&ancestor)? {
                    missing.push(ancestor);
                }
            }
            Ok(missing)
        })?;

        for ancestor in missing {
            self.batcher.push(Node::placeholder(ancestor))?;
        }
        self.batcher.push(node)
    }

    /// Commit everything the auto-batching writer holds and wait for it.
    /// Returns the number of nodes written.
    pub fn flush_pending(&self) -> Result<usize, SnapshotError> {
        self.batcher.flush()
    }

    /// Live-change notifications need a streaming store; not supported.
    pub fn watch(&self, _path: &str) -> Result<(), SnapshotError> {
        Err(SnapshotError::NotImplemented("watch"))
    }

    /// Checksums are not stored by the snapshot; not supported.
    pub fn compute_checksum(&self, _node: &mut Node) -> Result<(), SnapshotError> {
        Err(SnapshotError::NotImplemented("compute_checksum"))
    }

    /// Stop the auto-batching writer (after its final flush), commit any
    /// open session, and close the store. With `delete` the snapshot's store
    /// is removed from disk, and its folder too once nothing else is left in
    /// it.
    pub fn close(self, delete: bool) -> Result<(), SnapshotError> {
        let Snapshot {
            name,
            folder_path,
            store,
            session,
            mut batcher,
            ..
        } = self;

        if let Some(buffer) = session.into_inner() {
            if buffer.pending_len() > 0 {
                warn!(
                    name = %name,
                    pending = buffer.pending_len(),
                    "Closing snapshot with an unfinished session, flushing it"
                );
                buffer.commit(&store)?;
            }
        }

        batcher.close();
        store.flush()?;
        let store_path = store.path().to_path_buf();
        drop(store);

        if delete {
            if store_path.exists() {
                std::fs::remove_dir_all(&store_path)?;
            }
            let folder_is_empty = std::fs::read_dir(&folder_path)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if folder_is_empty {
                std::fs::remove_dir(&folder_path)?;
            }
            info!(name = %name, path = %store_path.display(), "Deleted snapshot");
        } else {
            debug!(name = %name, "Closed snapshot");
        }
        Ok(())
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn mark_populated(&self) {
        self.empty.store(false, Ordering::SeqCst);
    }
}

/// Normalize the node's path to key form, refusing the root.
pub(crate) fn normalized(mut node: Node) -> Result<Node, SnapshotError> {
    let key = path::normalize(&node.path);
    if key.is_empty() {
        return Err(SnapshotError::InvalidPath(node.path));
    }
    node.path = key;
    Ok(node)
}

/// True when `key` holds a node other than a synthesized placeholder.
pub(crate) fn is_occupied(view: &ReadView<'_>, key: &str) -> Result<bool, SnapshotError> {
    match view.get(key)? {
        Some(raw) => Ok(!codec::decode(&raw)?.is_placeholder()),
        None => Ok(false),
    }
}
