//! Tools exposed by a ready server handle.

use anyagent_core::{AgentFramework, McpError, McpTool, McpToolResult};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Weak};

use crate::client::McpSession;

/// A tool resolved from a live MCP server.
///
/// The descriptor is fixed once setup completes. Invocation goes through the
/// session of the handle that resolved it and stops working once that handle
/// is torn down.
#[derive(Clone)]
pub struct ResolvedTool {
    definition: McpTool,
    framework: AgentFramework,
    session: Weak<McpSession>,
}

impl ResolvedTool {
    pub(crate) fn new(
        definition: McpTool,
        framework: AgentFramework,
        session: &Arc<McpSession>,
    ) -> Self {
        Self {
            definition,
            framework,
            session: Arc::downgrade(session),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> Option<&str> {
        self.definition.description.as_deref()
    }

    pub fn input_schema(&self) -> Option<&Value> {
        self.definition.input_schema.as_ref()
    }

    /// The tool definition as advertised (after any framework conversion).
    pub const fn definition(&self) -> &McpTool {
        &self.definition
    }

    /// Framework the tool was resolved for.
    pub const fn framework(&self) -> AgentFramework {
        self.framework
    }

    /// Whether the owning session is still open.
    pub fn is_live(&self) -> bool {
        self.session
            .upgrade()
            .is_some_and(|session| !session.is_closed())
    }

    /// Call the tool on its server.
    pub async fn invoke(&self, arguments: Map<String, Value>) -> Result<McpToolResult, McpError> {
        let session = self.session.upgrade().ok_or_else(|| {
            McpError::transport(
                self.name(),
                "MCP server for this tool has been torn down",
            )
        })?;

        tracing::debug!(tool = self.name(), server = session.server_label(), "Invoking MCP tool");
        session.call_tool(self.name(), arguments).await
    }
}

impl fmt::Debug for ResolvedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTool")
            .field("name", &self.definition.name)
            .field("framework", &self.framework)
            .field("live", &self.is_live())
            .finish()
    }
}
