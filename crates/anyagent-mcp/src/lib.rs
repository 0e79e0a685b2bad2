//! MCP server lifecycle management for agent frameworks.
//!
//! A [`ServerHandle`] launches one MCP server through the native client shape
//! of the selected [`AgentFramework`], resolves its tools (optionally
//! restricted to an allow-list) and keeps the server alive until it is torn
//! down. [`McpRegistry`] owns several handles on behalf of an agent.
//!
//! ```no_run
//! use anyagent_mcp::{AgentFramework, ServerHandle, ServerSpec};
//!
//! # async fn run() -> Result<(), anyagent_mcp::McpError> {
//! let spec = ServerSpec::new("uvx", ["mcp-server-fetch"]).with_tools(["fetch"]);
//! let mut handle = ServerHandle::new(spec, AgentFramework::Langchain)?;
//! let tools = handle.setup().await?;
//! assert_eq!(tools[0].name(), "fetch");
//! handle.teardown().await?;
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub(crate) mod adapter;
pub mod client;
pub mod connector;
pub mod handle;
pub(crate) mod lifecycle;
pub mod registry;
pub mod tool;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export domain types from core for convenience
pub use anyagent_core::{
    AgentFramework, FrameworkCapabilities, HandleId, LaunchTarget, LifecycleEvent,
    LifecycleEventEmitter, LifecycleState, McpError, McpTool, McpToolResult, McpTransport,
    NoopEmitter, ResourceFailure, ServerSpec, TeardownError, ToolFiltering, TransportConnector,
};

// Re-export this crate's public types
pub use adapter::is_available;
pub use client::{InitializeResult, McpSession, ServerInfo};
pub use connector::ProcessConnector;
pub use handle::ServerHandle;
pub use registry::{McpRegistry, RegisteredServer};
pub use tool::ResolvedTool;

// Dev-dependency only exercised by the integration tests
#[cfg(test)]
use tempfile as _;
