//! Streamable HTTP transport for MCP.
//!
//! Every request is an HTTP POST carrying one JSON-RPC message. The server
//! answers with either a JSON body or an SSE stream whose `data:` events hold
//! JSON-RPC messages. A session id handed out by the server is echoed on every
//! subsequent request and released with a DELETE on close.

use anyagent_core::{McpError, McpTransport};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::jsonrpc::{JsonRpcMessage, JsonRpcNotification, JsonRpcRequest};

const SESSION_HEADER: &str = "mcp-session-id";
const ACCEPT_VALUE: &str = "application/json, text/event-stream";

/// HTTP transport for MCP communication.
#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    client: Client,
    session_id: Mutex<Option<String>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpTransport {
    /// Create a transport for the given endpoint. No request is sent yet.
    pub fn new(url: impl Into<String>) -> Result<Self, McpError> {
        let url = url.into();
        let client = Client::builder()
            .user_agent(concat!("anyagent-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| McpError::transport(&url, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url,
            client,
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    fn error(&self, reason: impl std::fmt::Display) -> McpError {
        McpError::transport(&self.url, reason)
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|guard| guard.clone())
    }

    fn remember_session(&self, headers: &HeaderMap) {
        let Some(id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) else {
            return;
        };
        if let Ok(mut guard) = self.session_id.lock() {
            if guard.as_deref() != Some(id) {
                tracing::debug!(server = %self.url, session_id = id, "MCP HTTP session established");
                *guard = Some(id.to_string());
            }
        }
    }

    async fn post(&self, body: &impl serde::Serialize) -> Result<reqwest::Response, McpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.error("transport is closed"));
        }

        let mut builder = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_VALUE)
            .json(body);

        if let Some(id) = self.session_id() {
            builder = builder.header(SESSION_HEADER, id);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.error(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.error(format!("HTTP {status}: {}", text.trim())));
        }

        self.remember_session(response.headers());
        Ok(response)
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let response = self.post(&JsonRpcRequest::new(id, method, params)).await?;

        let is_sse = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        let body = response
            .text()
            .await
            .map_err(|e| self.error(format!("failed to read HTTP body: {e}")))?;

        let messages = if is_sse {
            parse_sse_messages(&body)
        } else {
            let message = serde_json::from_str::<JsonRpcMessage>(&body)
                .map_err(|e| self.error(format!("invalid JSON-RPC response: {e}")))?;
            vec![message]
        };

        messages
            .into_iter()
            .find(|m| m.response_id() == Some(id))
            .ok_or_else(|| self.error(format!("no response for request {id} ({method})")))?
            .into_result()
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        self.post(&JsonRpcNotification::new(method, params))
            .await
            .map(drop)
    }

    async fn close(&self) -> Result<(), McpError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let Some(id) = self.session_id() else {
            return Ok(());
        };

        let response = self
            .client
            .delete(&self.url)
            .header(SESSION_HEADER, id)
            .send()
            .await
            .map_err(|e| self.error(format!("failed to end HTTP session: {e}")))?;

        // Servers without explicit session termination answer 405.
        match response.status() {
            status if status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            status => Err(self.error(format!("failed to end HTTP session: HTTP {status}"))),
        }
    }

    fn server_label(&self) -> &str {
        &self.url
    }
}

/// Extract JSON-RPC messages from an SSE body.
///
/// Events are separated by blank lines; multiple `data:` lines within one
/// event are joined with newlines. Events that are not JSON-RPC are ignored.
fn parse_sse_messages(body: &str) -> Vec<JsonRpcMessage> {
    let mut messages = Vec::new();
    let mut data = String::new();

    let mut flush = |data: &mut String| {
        if !data.is_empty() {
            if let Ok(message) = serde_json::from_str::<JsonRpcMessage>(data) {
                messages.push(message);
            }
            data.clear();
        }
    };

    for line in body.lines() {
        if line.is_empty() {
            flush(&mut data);
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    flush(&mut data);

    messages
}
