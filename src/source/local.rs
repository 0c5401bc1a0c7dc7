//! Local filesystem tree source

use crate::error::SnapshotError;
use crate::source::{TreeSource, WalkVisitor};
use crate::tree::hasher::etag_for_file;
use crate::tree::{path, Node};
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Walks a directory on disk. Keys are paths relative to the source root.
pub struct LocalSource {
    root: PathBuf,
    hash_content: bool,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hash_content: true,
        }
    }

    /// Skip content hashing; leaves get an empty etag.
    pub fn without_content_hash(mut self) -> Self {
        self.hash_content = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_for(&self, full: &Path) -> String {
        let relative = full.strip_prefix(&self.root).unwrap_or(full);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn node_for(&self, key: &str, entry: &DirEntry) -> Result<Node, SnapshotError> {
        let metadata = entry
            .metadata()
            .map_err(|e| SnapshotError::SourceWalk(format!("{}: {}", key, e)))?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        if metadata.is_dir() {
            return Ok(Node::collection(key, "", mtime));
        }

        let etag = if self.hash_content {
            etag_for_file(entry.path())?
        } else {
            String::new()
        };
        Ok(Node::leaf(key, etag, metadata.len() as i64, mtime))
    }
}

impl TreeSource for LocalSource {
    fn walk(&self, root: &str, recursive: bool, visit: &mut WalkVisitor<'_>) -> Result<(), SnapshotError> {
        let base = self.root.join(path::normalize(root));
        if !base.is_dir() {
            return Err(SnapshotError::SourceWalk(format!(
                "{} is not a readable directory",
                base.display()
            )));
        }

        let mut walker = WalkDir::new(&base)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.path_is_symlink() {
                        debug!(path = %entry.path().display(), "Skipping symlink");
                        continue;
                    }
                    let key = self.key_for(entry.path());
                    let node = self.node_for(&key, &entry);
                    visit(&key, node);
                }
                Err(e) => {
                    let key = e.path().map(|p| self.key_for(p)).unwrap_or_default();
                    visit(&key, Err(SnapshotError::SourceWalk(e.to_string())));
                }
            }
        }
        Ok(())
    }
}
