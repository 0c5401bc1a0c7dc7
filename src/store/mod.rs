//! Snapshot Store
//!
//! Wraps the embedded sled database behind two transaction primitives:
//! `with_read_view` for consistent reads and `with_read_write` for atomic
//! multi-key updates. The live tree is the `snapshot` bucket; a `capture`
//! bucket exists only while a capture is being staged.

pub mod transaction;

pub use transaction::{CaptureStage, ReadView, WriteTxn};

use crate::concurrency::CommitGate;
use crate::error::StorageError;
use crate::types::{CAPTURE_BUCKET, LIVE_BUCKET};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Delay between attempts to take the store's file lock
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Options used when opening a store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long to wait for another holder to release the file lock
    pub lock_timeout: Duration,
    /// sled page cache size in bytes
    pub cache_capacity: u64,
    /// Background fsync interval, `None` to only flush on close
    pub flush_every_ms: Option<u64>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            cache_capacity: 64 * 1024 * 1024,
            flush_every_ms: Some(500),
        }
    }
}

/// An opened snapshot store
pub struct Store {
    db: sled::Db,
    live: sled::Tree,
    path: PathBuf,
    gate: CommitGate,
}

impl Store {
    /// Open (or create) the store at `path`, waiting up to
    /// `options.lock_timeout` for the file lock.
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self, StorageError> {
        let db = open_with_lock_wait(path, options)?;

        if has_tree(&db, CAPTURE_BUCKET)? {
            warn!(path = %path.display(), "Dropping stale capture bucket");
            db.drop_tree(CAPTURE_BUCKET)?;
        }

        let live = db.open_tree(LIVE_BUCKET)?;
        debug!(path = %path.display(), entries = live.len(), "Opened snapshot store");

        Ok(Self {
            db,
            live,
            path: path.to_path_buf(),
            gate: CommitGate::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of committed entries in the live tree.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Run `f` against the last committed state of the live tree.
    ///
    /// A commit is never observed half-applied. `f` must not open a write
    /// transaction on the same store.
    pub fn with_read_view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&ReadView<'_>) -> Result<T, E>,
    {
        let _read = self.gate.read();
        f(&ReadView::new(&self.live))
    }

    /// Run `f` as an exclusive write transaction. Its mutations are applied
    /// atomically iff `f` returns `Ok`, and discarded otherwise.
    pub fn with_read_write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _writer = self.gate.writer();
        let mut txn = WriteTxn::new(&self.live);
        let out = f(&mut txn)?;
        if let Some(batch) = txn.into_batch() {
            let _apply = self.gate.apply();
            self.live
                .apply_batch(batch)
                .map_err(|e| E::from(StorageError::from(e)))?;
        }
        Ok(out)
    }

    /// Replace the live tree with whatever `fill` stages.
    ///
    /// The capture bucket is recreated empty, handed to `fill`, and on success
    /// its content becomes the live tree in one atomic batch. If `fill` fails
    /// the live tree is untouched. Other writers wait for the whole operation.
    /// Returns `fill`'s output and the number of live entries afterwards.
    pub fn capture<T, E, F>(&self, fill: F) -> Result<(T, usize), E>
    where
        F: FnOnce(&mut CaptureStage<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _writer = self.gate.writer();

        self.db.drop_tree(CAPTURE_BUCKET).map_err(StorageError::from)?;
        let staging = self
            .db
            .open_tree(CAPTURE_BUCKET)
            .map_err(StorageError::from)?;

        let mut stage = CaptureStage::new(&staging);
        let out = match fill(&mut stage) {
            Ok(out) => out,
            Err(e) => {
                self.discard_capture();
                return Err(e);
            }
        };

        match self.promote(&staging) {
            Ok(count) => {
                drop(staging);
                self.discard_capture();
                Ok((out, count))
            }
            Err(e) => {
                self.discard_capture();
                Err(E::from(e))
            }
        }
    }

    /// True while a capture bucket exists on disk.
    pub fn has_capture_bucket(&self) -> Result<bool, StorageError> {
        has_tree(&self.db, CAPTURE_BUCKET)
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn promote(&self, staging: &sled::Tree) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        for key in self.live.iter().keys() {
            let key = key?;
            if !staging.contains_key(&key)? {
                batch.remove(key);
            }
        }
        let mut count = 0;
        for entry in staging.iter() {
            let (key, value) = entry?;
            batch.insert(key, value);
            count += 1;
        }

        let _apply = self.gate.apply();
        self.live.apply_batch(batch)?;
        Ok(count)
    }

    fn discard_capture(&self) {
        if let Err(e) = self.db.drop_tree(CAPTURE_BUCKET) {
            warn!(path = %self.path.display(), error = %e, "Failed to drop capture bucket");
        }
    }
}

fn has_tree(db: &sled::Db, name: &str) -> Result<bool, StorageError> {
    Ok(db
        .tree_names()
        .iter()
        .any(|tree_name| &tree_name[..] == name.as_bytes()))
}

fn open_with_lock_wait(path: &Path, options: &StoreOptions) -> Result<sled::Db, StorageError> {
    let config = sled::Config::new()
        .path(path)
        .cache_capacity(options.cache_capacity)
        .flush_every_ms(options.flush_every_ms);

    let started = Instant::now();
    loop {
        match config.open() {
            Ok(db) => return Ok(db),
            Err(sled::Error::Io(e)) if is_lock_conflict(&e) => {
                let waited = started.elapsed();
                if waited >= options.lock_timeout {
                    return Err(StorageError::LockTimeout {
                        path: path.to_path_buf(),
                        waited,
                    });
                }
                debug!(path = %path.display(), "Store is locked, retrying");
                thread::sleep(LOCK_RETRY_INTERVAL.min(options.lock_timeout - waited));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// sled reports a held file lock as an `Other` I/O error with this message.
const LOCK_CONFLICT_MESSAGE: &str = "could not acquire lock";

fn is_lock_conflict(err: &std::io::Error) -> bool {
    match err.kind() {
        std::io::ErrorKind::WouldBlock => true,
        std::io::ErrorKind::Other => err.to_string().contains(LOCK_CONFLICT_MESSAGE),
        _ => false,
    }
}
