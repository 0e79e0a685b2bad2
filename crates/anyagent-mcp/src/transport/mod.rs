//! JSON-RPC transports to MCP servers.
//!
//! - [`StdioTransport`] - spawned child process, one JSON message per line
//! - [`HttpTransport`] - streamable HTTP endpoint (JSON or SSE replies)

mod http;
pub(crate) mod jsonrpc;
mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;
