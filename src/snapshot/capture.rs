//! Capture
//!
//! Replaces the whole live tree with the output of a `TreeSource` walk. The
//! walk is staged in the capture bucket first and promoted only once the
//! source has been fully drained, so a source failure leaves the previous
//! tree in place.

use super::Snapshot;
use crate::error::{SnapshotError, StorageError};
use crate::source::TreeSource;
use crate::tree::{codec, path};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

/// Outcome of a capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    /// Nodes written to the staging bucket
    pub captured: usize,
    /// Per-entry source errors that were logged and skipped
    pub skipped: usize,
    /// Live entries after promotion
    pub entries: usize,
}

impl Snapshot {
    /// Walk `source` recursively from each of `paths` (the whole tree when
    /// empty) and make the result the new content of the snapshot.
    pub fn capture<S>(&self, source: &S, paths: &[&str]) -> Result<CaptureReport, SnapshotError>
    where
        S: TreeSource + ?Sized,
    {
        let roots: Vec<&str> = if paths.is_empty() { vec!["/"] } else { paths.to_vec() };
        let started = Instant::now();

        let (mut report, entries) = self.store().capture(|stage| -> Result<CaptureReport, SnapshotError> {
            let mut report = CaptureReport::default();
            for root in &roots {
                let mut failure: Option<StorageError> = None;
                source
                    .walk(root, true, &mut |key, entry| {
                        if failure.is_some() {
                            return;
                        }
                        let node = match entry {
                            Ok(node) => node,
                            Err(e) => {
                                error!(path = %key, error = %e, "Skipping capture entry");
                                report.skipped += 1;
                                return;
                            }
                        };
                        let key = path::normalize(&node.path);
                        if key.is_empty() {
                            return;
                        }
                        let stored = codec::encode(&node.with_path(key.clone()))
                            .and_then(|bytes| stage.put(&key, bytes));
                        match stored {
                            Ok(()) => report.captured += 1,
                            Err(e) => failure = Some(e),
                        }
                    })
                    .map_err(|e| match e {
                        SnapshotError::SourceWalk(_) => e,
                        other => SnapshotError::SourceWalk(other.to_string()),
                    })?;
                if let Some(e) = failure {
                    return Err(e.into());
                }
            }
            Ok(report)
        })?;

        report.entries = entries;
        self.mark_populated();
        info!(
            name = %self.name(),
            captured = report.captured,
            skipped = report.skipped,
            entries,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Captured snapshot"
        );
        Ok(report)
    }
}
