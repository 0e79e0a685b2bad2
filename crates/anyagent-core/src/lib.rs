//! Core domain types and ports for running MCP tool servers under any agent
//! framework.
//!
//! This crate holds everything that is independent of process management and
//! wire transports: the declarative [`ServerSpec`], the framework tags and
//! their capabilities, the lifecycle error taxonomy, lifecycle events and the
//! trait abstractions (ports) that `anyagent-mcp` implements.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{ConfigError, FRAMEWORK_ENV_VAR, McpToolsConfig};
pub use domain::{
    AgentFramework, FrameworkCapabilities, HandleId, LifecycleState, McpTool, McpToolResult,
    ServerSpec, ToolFiltering, TransportShape,
};
pub use error::{McpError, ResourceFailure, TeardownError};
pub use events::LifecycleEvent;
pub use ports::{
    LaunchTarget, LifecycleEventEmitter, McpTransport, NoopEmitter, TransportConnector,
};
