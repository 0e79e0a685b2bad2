//! MCP client session on top of a JSON-RPC transport.
//!
//! Implements the client side of the MCP handshake, tool discovery and tool
//! invocation. Reference: <https://spec.modelcontextprotocol.io/>

use anyagent_core::{McpError, McpTool, McpToolResult, McpTransport};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP initialize result.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(default, rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(default, rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

/// Server information from initialize.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Server capabilities.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerCapabilities {
    #[serde(default)]
    pub tools: Option<Value>,
    #[serde(default)]
    pub resources: Option<Value>,
    #[serde(default)]
    pub prompts: Option<Value>,
}

/// One page of `tools/list`.
#[derive(Debug, Deserialize)]
struct ToolsPage {
    #[serde(default)]
    tools: Vec<McpTool>,
    #[serde(default, rename = "nextCursor")]
    next_cursor: Option<String>,
}

/// An initialized (or initializing) MCP client session.
///
/// The session shares its transport with whichever lifecycle resource owns
/// it. Closing the session only stops new calls; releasing the transport is
/// the owner's job.
pub struct McpSession {
    transport: Arc<dyn McpTransport>,
    initialized: OnceLock<InitializeResult>,
    closed: AtomicBool,
}

impl McpSession {
    /// Create a session over an open transport. No message is sent yet.
    pub fn new(transport: Arc<dyn McpTransport>) -> Self {
        Self {
            transport,
            initialized: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Perform the `initialize` handshake and send `notifications/initialized`.
    pub async fn initialize(&self) -> Result<InitializeResult, McpError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": "anyagent",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {}
        });

        let value = self.request("initialize", Some(params)).await?;
        let result: InitializeResult = serde_json::from_value(value).map_err(|e| {
            McpError::transport(
                self.server_label(),
                format!("failed to parse initialize response: {e}"),
            )
        })?;

        self.transport
            .notify("notifications/initialized", None)
            .await?;

        tracing::debug!(
            server = self.server_label(),
            server_name = ?result.server_info.as_ref().map(|i| &i.name),
            protocol_version = ?result.protocol_version,
            "MCP session initialized"
        );

        Ok(self.initialized.get_or_init(|| result).clone())
    }

    /// List every tool the server advertises, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        // Check if server supports tools
        if self
            .initialized
            .get()
            .is_some_and(|init| init.capabilities.tools.is_none())
        {
            tracing::debug!(
                server = self.server_label(),
                "Server does not advertise the tools capability"
            );
            return Ok(Vec::new());
        }

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.take().map(|c| json!({ "cursor": c }));
            let value = self.request("tools/list", params).await?;
            let page: ToolsPage = serde_json::from_value(value).map_err(|e| {
                McpError::transport(
                    self.server_label(),
                    format!("failed to parse tools/list response: {e}"),
                )
            })?;

            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }

    /// Call a tool on the server.
    ///
    /// A tool-level failure (`isError: true`) is returned as an unsuccessful
    /// [`McpToolResult`], not as an error.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<McpToolResult, McpError> {
        let params = json!({
            "name": name,
            "arguments": arguments
        });

        let result = self.request("tools/call", Some(params)).await?;

        // MCP returns content array with text/image items
        let content = result.get("content").cloned().unwrap_or_else(|| json!([]));
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if is_error {
            let message = content
                .as_array()
                .and_then(|items| items.first())
                .and_then(|item| item.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            Ok(McpToolResult::error(message))
        } else {
            Ok(McpToolResult::success(content))
        }
    }

    /// Stop accepting calls. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(server = self.server_label(), "MCP session closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Server info (available after initialize).
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.initialized.get().and_then(|i| i.server_info.as_ref())
    }

    /// Label of the server on the other end.
    pub fn server_label(&self) -> &str {
        self.transport.server_label()
    }

    /// The transport this session talks over.
    pub fn transport(&self) -> &Arc<dyn McpTransport> {
        &self.transport
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        if self.is_closed() {
            return Err(McpError::transport(self.server_label(), "session is closed"));
        }
        self.transport.request(method, params).await
    }
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("server", &self.server_label())
            .field("initialized", &self.initialized.get().is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeServer, FakeTransport};

    fn session(server: FakeServer) -> (Arc<FakeTransport>, McpSession) {
        let transport = Arc::new(FakeTransport::new("fake", server));
        let session = McpSession::new(Arc::clone(&transport) as Arc<dyn McpTransport>);
        (transport, session)
    }

    #[tokio::test]
    async fn test_initialize_sends_initialized_notification() {
        let (transport, session) = session(FakeServer::with_tools(&["search"]));

        let result = session.initialize().await.unwrap();
        assert_eq!(result.server_info.unwrap().name, "fake-server");
        assert_eq!(session.server_info().unwrap().name, "fake-server");
        assert_eq!(transport.notifications(), vec!["notifications/initialized"]);
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor() {
        let server = FakeServer::with_tools(&["a", "b", "c", "d", "e"]).with_page_size(2);
        let (transport, session) = session(server);
        session.initialize().await.unwrap();

        let names: Vec<_> = session
            .list_tools()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();

        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        let list_calls = transport
            .requests()
            .iter()
            .filter(|m| m.as_str() == "tools/list")
            .count();
        assert_eq!(list_calls, 3);
    }

    #[tokio::test]
    async fn test_list_tools_without_capability_is_empty() {
        let server = FakeServer::with_tools(&["hidden"]).without_tools_capability();
        let (_transport, session) = session(server);
        session.initialize().await.unwrap();

        assert!(session.list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_call_tool_success_and_tool_error() {
        let (_transport, session) = session(FakeServer::with_tools(&["search"]));
        session.initialize().await.unwrap();

        let mut args = Map::new();
        args.insert("q".into(), json!("rust"));
        let ok = session.call_tool("search", args).await.unwrap();
        assert!(ok.success);
        assert_eq!(ok.data.unwrap()[0]["text"], "search called with {\"q\":\"rust\"}");

        let failed = session.call_tool("missing", Map::new()).await.unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("unknown tool: missing"));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let (transport, session) = session(FakeServer::with_tools(&["search"]));
        session.initialize().await.unwrap();
        session.close();
        session.close();

        let err = session.call_tool("search", Map::new()).await.unwrap_err();
        assert!(err.is_transport());
        // Closing the session leaves the transport to its owner
        assert_eq!(transport.close_calls(), 0);
    }
}
