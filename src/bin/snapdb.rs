//! Snapdb CLI Binary
//!
//! Command-line interface for the snapshot store.

use anyhow::Context;
use clap::Parser;
use snapdb::config::ConfigLoader;
use snapdb::logging::init_logging;
use snapdb::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: Cli) -> anyhow::Result<String> {
    let config = ConfigLoader::load(cli.config.as_deref()).context("Error loading configuration")?;
    init_logging(Some(&config.logging)).context("Error initializing logging")?;

    let context = CliContext::with_config(cli.root.clone(), &cli.name, &config, cli.format)
        .with_context(|| format!("Error opening snapshot {}", cli.name))?;
    let output = context.execute(&cli.command)?;
    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
