//! Tree records: nodes, their stored form, and the path key scheme.

pub mod codec;
pub mod hasher;
pub mod node;
pub mod path;

pub use node::{Node, NodeType};
