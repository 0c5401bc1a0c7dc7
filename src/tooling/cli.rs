//! CLI Tooling
//!
//! Command-line interface over a single snapshot. Each invocation opens the
//! snapshot, runs one command and closes it again.

use crate::config::{ConfigLoader, SnapdbConfig};
use crate::error::SnapshotError;
use crate::snapshot::{CaptureReport, Snapshot, SnapshotOptions};
use crate::source::LocalSource;
use crate::tree::node::{META_RECURSIVE_FILES, META_RECURSIVE_FOLDERS, META_RECURSIVE_SIZE};
use crate::tree::{Node, NodeType};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Snapdb CLI - persistent file-tree snapshots
#[derive(Parser)]
#[command(name = "snapdb")]
#[command(about = "Capture, inspect and edit persistent file-tree snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Folder holding snapshot stores (defaults to the configured root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Snapshot name
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Configuration file path (layered over the default config sources)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replace the snapshot with the content of a local directory
    Capture {
        /// Directory to capture
        dir: PathBuf,
        /// Limit the capture to these paths below the directory
        paths: Vec<String>,
        /// Skip content hashing (leaves get an empty etag)
        #[arg(long)]
        no_hash: bool,
    },
    /// List nodes below a path
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Include every descendant, not just direct children
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show one node
    Stat {
        path: String,
        /// Include recursive size and counts
        #[arg(long)]
        stats: bool,
    },
    /// Create a collection node
    Mkdir { path: String },
    /// Move a node and its subtree
    Mv { from: String, to: String },
    /// Delete a node and its subtree
    Rm { path: String },
    /// Show snapshot information
    Info,
    /// Delete the snapshot from disk
    Destroy,
}

/// CLI context owning the opened snapshot
pub struct CliContext {
    snapshot: Snapshot,
    format: OutputFormat,
}

impl CliContext {
    /// Load configuration and open the snapshot named `name`.
    pub fn new(
        root: Option<PathBuf>,
        name: &str,
        config_path: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self, SnapshotError> {
        let config = load_config(config_path)?;
        Self::with_config(root, name, &config, format)
    }

    /// Open the snapshot `name` using an already loaded configuration.
    pub fn with_config(
        root: Option<PathBuf>,
        name: &str,
        config: &SnapdbConfig,
        format: OutputFormat,
    ) -> Result<Self, SnapshotError> {
        let root = match root {
            Some(root) => root,
            None => config.storage.snapshots_root()?,
        };
        let snapshot = Snapshot::open_with(&root, name, &SnapshotOptions::from(config))?;
        Ok(Self { snapshot, format })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Execute a CLI command and close the snapshot.
    pub fn execute(self, command: &Commands) -> Result<String, SnapshotError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        let delete = matches!(command, Commands::Destroy) && result.is_ok();
        self.snapshot.close(delete)?;
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, SnapshotError> {
        match command {
            Commands::Capture { dir, paths, no_hash } => {
                let mut source = LocalSource::new(dir);
                if *no_hash {
                    source = source.without_content_hash();
                }
                let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
                let report = self.snapshot.capture(&source, &paths)?;
                self.format_capture_report(&report)
            }
            Commands::Ls { path, recursive } => {
                let nodes = self.snapshot.list(path, *recursive)?;
                self.format_nodes(&nodes)
            }
            Commands::Stat { path, stats } => {
                let node = self.snapshot.load_node(path, *stats)?;
                self.format_node(&node)
            }
            Commands::Mkdir { path } => {
                let node = Node::collection(path.as_str(), "", chrono::Utc::now().timestamp());
                self.snapshot.create_node(node, false)?;
                self.snapshot.flush_pending()?;
                Ok(format!("Created {}", path))
            }
            Commands::Mv { from, to } => {
                self.snapshot.move_node(from, to)?;
                Ok(format!("Moved {} -> {}", from, to))
            }
            Commands::Rm { path } => {
                self.snapshot.delete_node(path)?;
                Ok(format!("Removed {}", path))
            }
            Commands::Info => self.format_info(),
            Commands::Destroy => Ok(format!(
                "Destroyed snapshot {} at {}",
                self.snapshot.name(),
                Snapshot::store_path(self.snapshot.folder_path(), self.snapshot.name()).display()
            )),
        }
    }

    fn format_capture_report(&self, report: &CaptureReport) -> Result<String, SnapshotError> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => Ok(format!(
                "Captured {} nodes ({} skipped), snapshot now holds {} entries",
                report.captured, report.skipped, report.entries
            )),
        }
    }

    fn format_nodes(&self, nodes: &[Node]) -> Result<String, SnapshotError> {
        if self.format == OutputFormat::Json {
            return to_json(&nodes);
        }
        if nodes.is_empty() {
            return Ok("No nodes.".to_string());
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Path", "Type", "Size", "Modified", "Etag"]);
        for node in nodes {
            table.add_row(vec![
                node.path.clone(),
                type_label(node).to_string(),
                node.size.to_string(),
                format_mtime(node.mtime),
                short_etag(&node.etag),
            ]);
        }
        Ok(table.to_string())
    }

    fn format_node(&self, node: &Node) -> Result<String, SnapshotError> {
        if self.format == OutputFormat::Json {
            return to_json(node);
        }
        let mut out = String::new();
        out.push_str(&format!("Path:     {}\n", node.path));
        out.push_str(&format!("Type:     {}\n", type_label(node)));
        out.push_str(&format!("Size:     {}\n", node.size));
        out.push_str(&format!("Modified: {}\n", format_mtime(node.mtime)));
        out.push_str(&format!("Etag:     {}\n", node.etag));
        if let Some(size) = node.meta_i64(META_RECURSIVE_SIZE) {
            out.push_str(&format!("Subtree size:    {}\n", size));
        }
        if let Some(files) = node.meta_i64(META_RECURSIVE_FILES) {
            out.push_str(&format!("Subtree files:   {}\n", files));
        }
        if let Some(folders) = node.meta_i64(META_RECURSIVE_FOLDERS) {
            out.push_str(&format!("Subtree folders: {}\n", folders));
        }
        Ok(out.trim_end().to_string())
    }

    fn format_info(&self) -> Result<String, SnapshotError> {
        let endpoint = self.snapshot.endpoint_info();
        let store_path = Snapshot::store_path(self.snapshot.folder_path(), self.snapshot.name());
        let entries = self.snapshot.entry_count();
        if self.format == OutputFormat::Json {
            return to_json(&json!({
                "name": self.snapshot.name(),
                "store_path": store_path,
                "empty": self.snapshot.is_empty(),
                "entries": entries,
                "endpoint": endpoint,
            }));
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.add_row(vec!["Name".to_string(), self.snapshot.name().to_string()]);
        table.add_row(vec!["Store".to_string(), store_path.display().to_string()]);
        table.add_row(vec!["Empty".to_string(), self.snapshot.is_empty().to_string()]);
        table.add_row(vec!["Entries".to_string(), entries.to_string()]);
        table.add_row(vec!["URI".to_string(), endpoint.uri]);
        Ok(table.to_string())
    }
}

fn load_config(config_path: Option<PathBuf>) -> Result<SnapdbConfig, SnapshotError> {
    Ok(ConfigLoader::load(config_path.as_deref())?)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, SnapshotError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| SnapshotError::ConfigError(format!("Failed to render JSON: {}", e)))
}

fn type_label(node: &Node) -> &'static str {
    match node.node_type {
        NodeType::Leaf => "file",
        NodeType::Collection if node.is_placeholder() => "dir*",
        NodeType::Collection => "dir",
    }
}

fn format_mtime(mtime: i64) -> String {
    if mtime <= 0 {
        return "-".to_string();
    }
    chrono::DateTime::from_timestamp(mtime, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| mtime.to_string())
}

fn short_etag(etag: &str) -> String {
    etag.chars().take(12).collect()
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Capture { .. } => "capture",
        Commands::Ls { .. } => "ls",
        Commands::Stat { .. } => "stat",
        Commands::Mkdir { .. } => "mkdir",
        Commands::Mv { .. } => "mv",
        Commands::Rm { .. } => "rm",
        Commands::Info => "info",
        Commands::Destroy => "destroy",
    }
}
