//! Tree sources
//!
//! Anything that can enumerate a file tree. Capture consumes a source; the
//! snapshot itself is one.

pub mod local;

pub use local::LocalSource;

use crate::error::SnapshotError;
use crate::tree::Node;

/// One entry produced by a walk. Per-entry failures are reported in place so
/// the consumer can skip them without stopping the walk.
pub type WalkEntry = Result<Node, SnapshotError>;

/// Visitor called for each walked entry with the entry's key.
pub type WalkVisitor<'a> = dyn FnMut(&str, WalkEntry) + 'a;

/// The `walk` capability
pub trait TreeSource {
    /// Visit every node below `root` (immediate children only unless
    /// `recursive`). An `Err` return means the source itself failed and the
    /// walk is incomplete.
    fn walk(&self, root: &str, recursive: bool, visit: &mut WalkVisitor<'_>) -> Result<(), SnapshotError>;
}

impl<S: TreeSource + ?Sized> TreeSource for &S {
    fn walk(&self, root: &str, recursive: bool, visit: &mut WalkVisitor<'_>) -> Result<(), SnapshotError> {
        (**self).walk(root, recursive, visit)
    }
}
