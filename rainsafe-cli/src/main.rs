//! Binary crate for the `rainsafe` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Logging setup and human-friendly output

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
