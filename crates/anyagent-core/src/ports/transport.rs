//! Transport and connector ports.

use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use crate::error::McpError;

/// What a connector should open.
#[derive(Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// Spawn a child process and talk JSON-RPC over its stdin/stdout.
    Stdio {
        /// Executable to run.
        program: String,
        /// Arguments, in order.
        args: Vec<String>,
        /// Full environment for the child, captured at construction time.
        env: Vec<(OsString, OsString)>,
    },
    /// Talk JSON-RPC over HTTP POST to an already running server.
    Http {
        /// Endpoint URL.
        url: String,
    },
}

impl LaunchTarget {
    /// Stdio target that inherits a snapshot of the host environment.
    pub fn stdio<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Stdio {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: std::env::vars_os().collect(),
        }
    }

    /// HTTP target.
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http { url: url.into() }
    }

    /// Short label used in logs and error messages.
    pub fn label(&self) -> &str {
        match self {
            Self::Stdio { program, .. } => program,
            Self::Http { url } => url,
        }
    }
}

// Environment values routinely hold secrets, so only the count is printed.
impl fmt::Debug for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio { program, args, env } => f
                .debug_struct("Stdio")
                .field("program", program)
                .field("args", args)
                .field("env_vars", &env.len())
                .finish(),
            Self::Http { url } => f.debug_struct("Http").field("url", url).finish(),
        }
    }
}

/// A JSON-RPC 2.0 channel to one MCP server.
///
/// Implementations own request-id allocation and response matching. `close`
/// must be safe to call more than once.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a request and return the `result` member of the matching response.
    ///
    /// A JSON-RPC error response maps to [`McpError::Rpc`]; every I/O or
    /// framing problem maps to [`McpError::Transport`].
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError>;

    /// Send a notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError>;

    /// Release the channel and anything it owns (pipes, child process, HTTP
    /// session).
    async fn close(&self) -> Result<(), McpError>;

    /// Label of the server on the other end.
    fn server_label(&self) -> &str;
}

/// Opens transports for launch targets.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Open a transport. No handshake is performed here.
    async fn connect(&self, target: &LaunchTarget) -> Result<Arc<dyn McpTransport>, McpError>;
}
