//! Concurrent access safety for the snapshot store
//!
//! Writers are serialized for the whole duration of a read-write transaction,
//! so a transaction can scan the store and rely on nothing changing under it.
//! Readers take a shared guard that only conflicts with the short window in
//! which a finished write transaction is applied, which keeps a read view from
//! observing half of a commit.

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Writer/reader coordination for one store
pub struct CommitGate {
    writer: Mutex<()>,
    commit: RwLock<()>,
}

impl CommitGate {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(()),
            commit: RwLock::new(()),
        }
    }

    /// Exclusive right to build a write transaction.
    pub fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock()
    }

    /// Shared guard held for the lifetime of a read view.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.commit.read()
    }

    /// Exclusive guard held while a transaction is applied.
    pub fn apply(&self) -> RwLockWriteGuard<'_, ()> {
        self.commit.write()
    }
}

impl Default for CommitGate {
    fn default() -> Self {
        Self::new()
    }
}
