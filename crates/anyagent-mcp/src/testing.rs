//! In-memory MCP servers for tests.
//!
//! [`FakeConnector`] hands out [`FakeTransport`]s that answer the MCP methods
//! the lifecycle uses from a scripted [`FakeServer`]. Enable the `test-utils`
//! feature to use these from other crates.

use anyagent_core::{
    LaunchTarget, LifecycleEvent, LifecycleEventEmitter, McpError, McpTool, McpTransport,
    TransportConnector,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Global ordering of `close` calls across every fake transport.
static CLOSE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Scripted behaviour of a fake MCP server.
#[derive(Debug, Clone)]
pub struct FakeServer {
    tools: Vec<McpTool>,
    tools_capability: bool,
    page_size: Option<usize>,
    initialize_error: Option<String>,
    hang_on: Option<String>,
    close_error: Option<String>,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            tools_capability: true,
            page_size: None,
            initialize_error: None,
            hang_on: None,
            close_error: None,
        }
    }
}

impl FakeServer {
    /// A server advertising the named tools, in order.
    pub fn with_tools(names: &[&str]) -> Self {
        Self {
            tools: names
                .iter()
                .map(|name| McpTool::new(*name).with_description(format!("The {name} tool")))
                .collect(),
            ..Self::default()
        }
    }

    /// Serve `tools/list` in pages of `size`.
    #[must_use]
    pub const fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Leave the tools capability out of the initialize result.
    #[must_use]
    pub const fn without_tools_capability(mut self) -> Self {
        self.tools_capability = false;
        self
    }

    /// Answer `initialize` with a JSON-RPC error.
    #[must_use]
    pub fn failing_initialize(mut self, message: impl Into<String>) -> Self {
        self.initialize_error = Some(message.into());
        self
    }

    /// Never answer requests for `method`.
    #[must_use]
    pub fn hanging_on(mut self, method: impl Into<String>) -> Self {
        self.hang_on = Some(method.into());
        self
    }

    /// Fail every `close` with `reason`.
    #[must_use]
    pub fn with_close_error(mut self, reason: impl Into<String>) -> Self {
        self.close_error = Some(reason.into());
        self
    }

    fn initialize_result(&self) -> Value {
        let capabilities = if self.tools_capability {
            json!({ "tools": {} })
        } else {
            json!({})
        };
        json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": { "name": "fake-server", "version": "1.0.0" },
            "capabilities": capabilities
        })
    }

    fn tools_page(&self, params: Option<&Value>) -> Value {
        let start = params
            .and_then(|p| p.get("cursor"))
            .and_then(Value::as_str)
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0)
            .min(self.tools.len());
        let end = self
            .page_size
            .map_or(self.tools.len(), |size| (start + size).min(self.tools.len()));

        let mut page = json!({ "tools": self.tools[start..end] });
        if end < self.tools.len() {
            page["nextCursor"] = json!(end.to_string());
        }
        page
    }

    fn call_tool(&self, params: Option<&Value>) -> Value {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let arguments = params
            .and_then(|p| p.get("arguments"))
            .cloned()
            .unwrap_or_else(|| json!({}));

        if self.tools.iter().any(|t| t.name == name) {
            json!({
                "content": [{ "type": "text", "text": format!("{name} called with {arguments}") }]
            })
        } else {
            json!({
                "content": [{ "type": "text", "text": format!("unknown tool: {name}") }],
                "isError": true
            })
        }
    }
}

/// Transport answering from a [`FakeServer`] and recording traffic.
#[derive(Debug)]
pub struct FakeTransport {
    label: String,
    server: FakeServer,
    requests: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
    closed_at: Mutex<Option<u64>>,
}

impl FakeTransport {
    pub fn new(label: impl Into<String>, server: FakeServer) -> Self {
        Self {
            label: label.into(),
            server,
            requests: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            closed_at: Mutex::new(None),
        }
    }

    /// Methods of every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Methods of every notification received, in order.
    pub fn notifications(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `close` was called.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls() > 0
    }

    /// Position of the first `close` call in the global close order.
    pub fn closed_at(&self) -> Option<u64> {
        *self.closed_at.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl McpTransport for FakeTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method.to_string());

        if self.server.hang_on.as_deref() == Some(method) {
            std::future::pending::<()>().await;
        }

        if self.is_closed() {
            return Err(McpError::transport(&self.label, "transport is closed"));
        }

        match method {
            "initialize" => match &self.server.initialize_error {
                Some(message) => Err(McpError::Rpc {
                    code: -32603,
                    message: message.clone(),
                }),
                None => Ok(self.server.initialize_result()),
            },
            "tools/list" => Ok(self.server.tools_page(params.as_ref())),
            "tools/call" => Ok(self.server.call_tool(params.as_ref())),
            _ => Err(McpError::Rpc {
                code: -32601,
                message: "Method not found".to_string(),
            }),
        }
    }

    async fn notify(&self, method: &str, _params: Option<Value>) -> Result<(), McpError> {
        if self.is_closed() {
            return Err(McpError::transport(&self.label, "transport is closed"));
        }
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), McpError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| CLOSE_SEQUENCE.fetch_add(1, Ordering::SeqCst));

        match &self.server.close_error {
            Some(reason) => Err(McpError::transport(&self.label, reason)),
            None => Ok(()),
        }
    }

    fn server_label(&self) -> &str {
        &self.label
    }
}

/// Connector handing out [`FakeTransport`]s.
#[derive(Debug, Default)]
pub struct FakeConnector {
    server: FakeServer,
    connect_error: Option<String>,
    connections: Mutex<Vec<Arc<FakeTransport>>>,
    targets: Mutex<Vec<LaunchTarget>>,
}

impl FakeConnector {
    /// Every connection talks to a copy of `server`.
    pub fn new(server: FakeServer) -> Self {
        Self {
            server,
            ..Self::default()
        }
    }

    /// Every connection attempt fails with a transport error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            connect_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Transports opened so far, in order.
    pub fn connections(&self) -> Vec<Arc<FakeTransport>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Targets requested so far, in order.
    pub fn targets(&self) -> Vec<LaunchTarget> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TransportConnector for FakeConnector {
    async fn connect(&self, target: &LaunchTarget) -> Result<Arc<dyn McpTransport>, McpError> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.clone());

        if let Some(reason) = &self.connect_error {
            return Err(McpError::transport(target.label(), reason));
        }

        let transport = Arc::new(FakeTransport::new(target.label(), self.server.clone()));
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&transport));
        Ok(transport)
    }
}

/// Emitter that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LifecycleEventEmitter for RecordingEmitter {
    fn emit(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
