//! Default connector: spawns processes and opens HTTP clients.

use anyagent_core::{LaunchTarget, McpError, McpTransport, TransportConnector};
use async_trait::async_trait;
use std::sync::Arc;

use crate::transport::{HttpTransport, StdioTransport};

/// Opens real transports for a [`LaunchTarget`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessConnector;

impl ProcessConnector {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportConnector for ProcessConnector {
    async fn connect(&self, target: &LaunchTarget) -> Result<Arc<dyn McpTransport>, McpError> {
        match target {
            LaunchTarget::Stdio { program, args, env } => {
                let transport = StdioTransport::spawn(program, args, env)?;
                Ok(Arc::new(transport))
            }
            LaunchTarget::Http { url } => {
                tracing::debug!(server = %url, "Opening MCP HTTP client");
                Ok(Arc::new(HttpTransport::new(url.as_str())?))
            }
        }
    }
}
