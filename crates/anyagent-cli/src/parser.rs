//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Launch MCP servers the way each agent framework would and inspect their
/// tools.
#[derive(Parser)]
#[command(name = "anyagent")]
#[command(about = "Probe MCP tool servers through agent framework adapters")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
