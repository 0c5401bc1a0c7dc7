//! Session Buffer
//!
//! Bulk loads stage their creates in memory and commit them in one
//! transaction per flush. One session at most is active per snapshot.

use super::{is_occupied, normalized, Snapshot};
use crate::error::SnapshotError;
use crate::store::Store;
use crate::tree::{codec, path, Node};
use crate::types::SessionId;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifies the active session to the session operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub uuid: SessionId,
    /// Path of the root node the session was started for, informational
    pub root: String,
    /// Quiet sessions log their flushes at debug level
    pub silent: bool,
}

pub(crate) struct SessionBuffer {
    uuid: SessionId,
    silent: bool,
    pending: BTreeMap<String, Node>,
}

impl SessionBuffer {
    fn new(uuid: SessionId, silent: bool) -> Self {
        Self {
            uuid,
            silent,
            pending: BTreeMap::new(),
        }
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn check(&self, session_id: &str) -> Result<(), SnapshotError> {
        if self.uuid != session_id {
            return Err(SnapshotError::SessionMismatch {
                expected: self.uuid.clone(),
                actual: session_id.to_string(),
            });
        }
        Ok(())
    }

    /// Write every pending node in one transaction, in path order. Pending
    /// nodes are kept if the transaction fails.
    pub(crate) fn commit(&self, store: &Store) -> Result<usize, SnapshotError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        store.with_read_write(|txn| -> Result<(), SnapshotError> {
            for (key, node) in &self.pending {
                txn.insert(key, codec::encode(node)?);
            }
            Ok(())
        })?;
        Ok(self.pending.len())
    }
}

impl Snapshot {
    /// Start a buffered session. A session that is still open is replaced
    /// and its unflushed writes are discarded.
    pub fn start_session(&self, root: Option<&Node>, silent: bool) -> SessionHandle {
        let uuid = Uuid::new_v4().to_string();
        let mut slot = self.session.lock();
        if let Some(previous) = slot.take() {
            if previous.pending_len() > 0 {
                warn!(
                    session = %previous.uuid,
                    discarded = previous.pending_len(),
                    "Replacing session with unflushed writes"
                );
            }
        }
        *slot = Some(SessionBuffer::new(uuid.clone(), silent));

        let root = root.map(|n| n.path.clone()).unwrap_or_else(|| "/".to_string());
        debug!(session = %uuid, root = %root, "Started session");
        SessionHandle { uuid, root, silent }
    }

    /// Identifier of the active session, if any.
    pub fn active_session(&self) -> Option<SessionId> {
        self.session.lock().as_ref().map(|s| s.uuid.clone())
    }

    /// Stage `node` in the session, with a placeholder for every ancestor
    /// that is neither committed nor already staged. Nothing reaches the
    /// store until the session is flushed.
    pub fn create_node_in_session(
        &self,
        session: &SessionHandle,
        node: Node,
        update_if_exists: bool,
    ) -> Result<(), SnapshotError> {
        let node = normalized(node)?;
        let mut slot = self.session.lock();
        let buffer = slot.as_mut().ok_or(SnapshotError::NoActiveSession)?;
        buffer.check(&session.uuid)?;

        self.store().with_read_view(|view| -> Result<(), SnapshotError> {
            if !update_if_exists {
                let staged = buffer
                    .pending
                    .get(&node.path)
                    .map(|n| !n.is_placeholder())
                    .unwrap_or(false);
                if staged || is_occupied(view, &node.path)? {
                    return Err(SnapshotError::AlreadyExists(node.path.clone()));
                }
            }
            for ancestor in path::ancestors(&node.path) {
                if buffer.pending.contains_key(&ancestor) || view.contains(&ancestor)? {
                    continue;
                }
                buffer
                    .pending
                    .insert(ancestor.clone(), Node::placeholder(ancestor));
            }
            Ok(())
        })?;

        buffer.pending.insert(node.path.clone(), node);
        Ok(())
    }

    /// Commit everything staged in the session. A no-op when nothing is
    /// staged.
    pub fn flush_session(&self, session_id: &str) -> Result<(), SnapshotError> {
        let mut slot = self.session.lock();
        let buffer = slot.as_mut().ok_or(SnapshotError::NoActiveSession)?;
        buffer.check(session_id)?;
        self.flush_buffer(buffer)
    }

    /// Flush the session one last time and end it. The session lock is held
    /// throughout, so a session started concurrently is never ended here.
    pub fn finish_session(&self, session_id: &str) -> Result<(), SnapshotError> {
        let mut slot = self.session.lock();
        let buffer = slot.as_mut().ok_or(SnapshotError::NoActiveSession)?;
        buffer.check(session_id)?;
        self.flush_buffer(buffer)?;
        slot.take();
        drop(slot);

        self.mark_populated();
        debug!(session = %session_id, "Finished session");
        Ok(())
    }

    fn flush_buffer(&self, buffer: &mut SessionBuffer) -> Result<(), SnapshotError> {
        let started = Instant::now();
        let count = buffer.commit(self.store())?;
        buffer.pending.clear();

        if count > 0 {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            if buffer.silent {
                debug!(session = %buffer.uuid, creates = count, elapsed_ms, "Flushed session creates");
            } else {
                info!(session = %buffer.uuid, creates = count, elapsed_ms, "Flushed session creates");
            }
        }
        Ok(())
    }
}
