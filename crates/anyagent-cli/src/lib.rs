//! Command-line front end for anyagent's MCP server lifecycle.
//!
//! `anyagent frameworks` lists the framework adapters compiled into this build;
//! `anyagent tools` launches the servers from a config file, prints the tools
//! they resolve to and tears them down again.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by main.rs only
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use commands::Commands;
pub use parser::Cli;
