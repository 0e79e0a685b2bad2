//! MCP lifecycle error types.
//!
//! Setup-time errors are always surfaced to the caller. Teardown-time failures
//! are collected into a [`TeardownError`] so that one stuck resource never
//! prevents the others from being released.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{AgentFramework, LifecycleState};

/// Errors raised by MCP server handles and their adapters.
#[derive(Debug, Error)]
pub enum McpError {
    /// The framework's adapter was compiled out. Raised at handle
    /// construction, before any process is spawned.
    #[error(
        "MCP support for {framework} is not available: enable the `{feature}` feature of anyagent-mcp"
    )]
    DependencyMissing {
        framework: AgentFramework,
        feature: &'static str,
    },

    /// The server process or session failed to start, handshake or
    /// communicate.
    #[error("transport error for MCP server '{server}': {reason}")]
    Transport { server: String, reason: String },

    /// One or more allow-listed tools are not advertised by the server.
    #[error(
        "Could not find all requested tools in the MCP server: requested {requested:?}, found {found:?}, missing {missing:?}"
    )]
    ToolResolution {
        requested: Vec<String>,
        found: Vec<String>,
        missing: Vec<String>,
    },

    /// One or more resources failed to close.
    #[error(transparent)]
    Teardown(#[from] TeardownError),

    /// An operation was attempted in the wrong lifecycle state.
    #[error("invalid MCP handle state: expected {expected}, found {actual}")]
    InvalidState {
        expected: LifecycleState,
        actual: LifecycleState,
    },

    /// The server spec is structurally invalid.
    #[error("invalid MCP server spec: {0}")]
    InvalidSpec(String),

    /// The server answered a request with a JSON-RPC error.
    #[error("MCP server returned error: code={code}, message={message}")]
    Rpc { code: i64, message: String },
}

impl McpError {
    /// Build a transport error for the named server.
    pub fn transport(server: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Transport {
            server: server.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from the transport layer.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// A single resource that failed to close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFailure {
    /// Label of the resource (e.g. "client session").
    pub resource: String,
    /// What went wrong.
    pub reason: String,
}

impl ResourceFailure {
    /// Create a new failure record.
    pub fn new(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ResourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "closing {} failed: {}", self.resource, self.reason)
    }
}

/// Aggregate of every resource that failed to close during one teardown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TeardownError {
    /// Individual failures, in release order.
    pub failures: Vec<ResourceFailure>,
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MCP resource(s) failed to close", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_resolution_message_names_missing() {
        let err = McpError::ToolResolution {
            requested: vec!["fetch".into(), "search".into()],
            found: vec!["search".into()],
            missing: vec!["fetch".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("requested [\"fetch\", \"search\"]"));
        assert!(msg.contains("missing [\"fetch\"]"));
    }

    #[test]
    fn test_dependency_missing_names_feature() {
        let err = McpError::DependencyMissing {
            framework: AgentFramework::LlamaIndex,
            feature: AgentFramework::LlamaIndex.feature_name(),
        };
        assert!(err.to_string().contains("`llama-index`"));
    }

    #[test]
    fn test_teardown_error_lists_every_failure() {
        let err = TeardownError {
            failures: vec![
                ResourceFailure::new("client session", "broken pipe"),
                ResourceFailure::new("stdio client", "kill failed"),
            ],
        };
        let msg = McpError::from(err).to_string();
        assert!(msg.starts_with("2 MCP resource(s) failed to close"));
        assert!(msg.contains("closing client session failed: broken pipe"));
        assert!(msg.contains("closing stdio client failed: kill failed"));
    }

    #[test]
    fn test_is_transport() {
        assert!(McpError::transport("srv", "exited").is_transport());
        assert!(!McpError::InvalidSpec("x".into()).is_transport());
    }
}
