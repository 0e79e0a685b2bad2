//! Available subcommands.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// List supported agent frameworks and what their MCP clients can do
    Frameworks {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Launch the configured MCP servers and list the tools they expose
    Tools {
        /// Path to a JSON config: {"framework": "...", "servers": [{"command", "args", "tools"}]}
        #[arg(short, long, env = "ANYAGENT_CONFIG")]
        config: PathBuf,
        /// Framework override (takes precedence over ANYAGENT_FRAMEWORK)
        #[arg(short, long)]
        framework: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}
