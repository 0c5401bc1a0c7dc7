//! Tooling & Integration Layer
//!
//! Command-line surface of the snapshot store.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, OutputFormat};
