//! MCP tool server domain types.
//!
//! These types describe MCP servers independent of any infrastructure
//! concerns (process management, wire transports, etc.).
//!
//! # Design
//!
//! - `ServerSpec` - Declarative launch description plus optional tool allow-list
//! - `McpTool` - Tool advertised by an MCP server
//! - `McpToolResult` - Result of a tool invocation
//! - `AgentFramework` - Tag selecting the framework adapter
//! - `FrameworkCapabilities` - What each adapter's native client can and cannot do
//! - `LifecycleState` - Handle state machine
//! - `HandleId` - Unique identifier of a live handle

mod framework;
mod lifecycle;
mod spec;
mod tool;

pub use framework::{AgentFramework, FrameworkCapabilities, ToolFiltering, TransportShape};
pub use lifecycle::{HandleId, LifecycleState};
pub use spec::ServerSpec;
pub use tool::{McpTool, McpToolResult};
