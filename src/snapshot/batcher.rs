//! Auto-Batching Writer
//!
//! A background worker that absorbs streaming node writes and commits them in
//! batches. Producers hand nodes over a rendezvous channel, so a push returns
//! only once the worker has taken the node and a slow flush throttles fast
//! producers. The pending map is owned by the worker thread alone.
//!
//! A batch is committed when it reaches `capacity` entries, when no write has
//! arrived for `idle_flush`, on an explicit flush request, and once more when
//! the writer is closed.

use crate::error::SnapshotError;
use crate::store::Store;
use crate::tree::{codec, Node};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

fn default_capacity() -> usize {
    500
}

fn default_idle_flush_ms() -> u64 {
    300
}

fn default_idle_wait_secs() -> u64 {
    3600
}

/// Auto-batch tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Pending entries that force an immediate flush
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Quiet period after the last write before pending entries are flushed
    #[serde(default = "default_idle_flush_ms")]
    pub idle_flush_ms: u64,

    /// Wait used while nothing is pending
    #[serde(default = "default_idle_wait_secs")]
    pub idle_wait_secs: u64,
}

impl BatchConfig {
    pub fn idle_flush(&self) -> Duration {
        Duration::from_millis(self.idle_flush_ms)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_secs(self.idle_wait_secs)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            idle_flush_ms: default_idle_flush_ms(),
            idle_wait_secs: default_idle_wait_secs(),
        }
    }
}

enum BatchCommand {
    Write(Node),
    Flush(Sender<Result<usize, SnapshotError>>),
}

/// Handle to the auto-batch worker of one snapshot
pub struct AutoBatcher {
    commands: Sender<BatchCommand>,
    close: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl AutoBatcher {
    /// Start the worker thread for `store`.
    pub fn spawn(store: Arc<Store>, config: BatchConfig) -> Result<Self, SnapshotError> {
        let (commands, command_rx) = bounded(0);
        let (close, close_rx) = bounded(1);

        let worker = thread::Builder::new()
            .name("snapdb-autobatch".to_string())
            .spawn(move || BatchWorker::new(store, config).run(command_rx, close_rx))?;

        Ok(Self {
            commands,
            close,
            worker: Some(worker),
        })
    }

    /// Hand a node to the worker. Blocks until the worker accepts it.
    pub fn push(&self, node: Node) -> Result<(), SnapshotError> {
        self.commands
            .send(BatchCommand::Write(node))
            .map_err(|_| SnapshotError::BatcherClosed)
    }

    /// Flush whatever is pending now and wait for the commit. Returns the
    /// number of nodes written.
    pub fn flush(&self) -> Result<usize, SnapshotError> {
        let (reply, reply_rx) = bounded(1);
        self.commands
            .send(BatchCommand::Flush(reply))
            .map_err(|_| SnapshotError::BatcherClosed)?;
        reply_rx.recv().map_err(|_| SnapshotError::BatcherClosed)?
    }

    /// Signal the worker to flush one last time and wait for it to exit.
    pub fn close(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.close.send(());
            if worker.join().is_err() {
                error!("Auto-batch worker panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for AutoBatcher {
    fn drop(&mut self) {
        self.close();
    }
}

struct BatchWorker {
    store: Arc<Store>,
    config: BatchConfig,
    pending: BTreeMap<String, Node>,
}

impl BatchWorker {
    fn new(store: Arc<Store>, config: BatchConfig) -> Self {
        Self {
            store,
            config,
            pending: BTreeMap::new(),
        }
    }

    fn run(mut self, commands: Receiver<BatchCommand>, close: Receiver<()>) {
        let mut wait = self.config.idle_wait();
        loop {
            select! {
                recv(commands) -> msg => match msg {
                    Ok(BatchCommand::Write(node)) => {
                        coalesce(&mut self.pending, node);
                        if self.pending.len() >= self.config.capacity {
                            self.flush_logged();
                            wait = self.config.idle_wait();
                        } else {
                            wait = self.config.idle_flush();
                        }
                    }
                    Ok(BatchCommand::Flush(reply)) => {
                        let _ = reply.send(self.flush());
                        wait = self.config.idle_wait();
                    }
                    Err(_) => {
                        self.flush_logged();
                        break;
                    }
                },
                recv(close) -> _ => {
                    self.flush_logged();
                    break;
                },
                default(wait) => {
                    self.flush_logged();
                    wait = self.config.idle_wait();
                },
            }
        }
        debug!("Closing auto-batcher");
    }

    fn flush(&mut self) -> Result<usize, SnapshotError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let batch = std::mem::take(&mut self.pending);
        let started = Instant::now();
        // BTreeMap iteration commits parents before their children
        self.store.with_read_write(|txn| -> Result<(), SnapshotError> {
            for (key, node) in &batch {
                txn.insert(key, codec::encode(node)?);
            }
            Ok(())
        })?;
        debug!(
            count = batch.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Flushed auto-batch"
        );
        Ok(batch.len())
    }

    fn flush_logged(&mut self) {
        if let Err(e) = self.flush() {
            error!(error = %e, "Auto-batch flush failed, batch dropped");
        }
    }
}

/// Merge `node` into the pending map. On a path collision the node with the
/// greater mtime is kept; on a tie a queued placeholder gives way.
pub(crate) fn coalesce(pending: &mut BTreeMap<String, Node>, node: Node) {
    let keep_queued = pending
        .get(&node.path)
        .map(|queued| {
            node.mtime < queued.mtime || (node.mtime == queued.mtime && !queued.is_placeholder())
        })
        .unwrap_or(false);
    if !keep_queued {
        pending.insert(node.path.clone(), node);
    }
}
