//! Resource bookkeeping and tool resolution shared by every adapter.

use anyagent_core::{McpError, McpTool, McpTransport, ResourceFailure};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::client::McpSession;

/// Something opened during setup that must be closed during teardown.
#[async_trait]
pub(crate) trait Release: Send + Sync {
    /// Label used in logs and in [`ResourceFailure`].
    fn label(&self) -> &str;

    async fn release(&self) -> Result<(), McpError>;
}

/// A bare transport (child process or HTTP client).
pub(crate) struct TransportResource {
    label: &'static str,
    transport: Arc<dyn McpTransport>,
}

impl TransportResource {
    pub(crate) fn new(label: &'static str, transport: Arc<dyn McpTransport>) -> Self {
        Self { label, transport }
    }
}

#[async_trait]
impl Release for TransportResource {
    fn label(&self) -> &str {
        self.label
    }

    async fn release(&self) -> Result<(), McpError> {
        self.transport.close().await
    }
}

/// A client session layered on a transport released separately.
pub(crate) struct SessionResource {
    label: &'static str,
    session: Arc<McpSession>,
}

impl SessionResource {
    pub(crate) fn new(label: &'static str, session: Arc<McpSession>) -> Self {
        Self { label, session }
    }
}

#[async_trait]
impl Release for SessionResource {
    fn label(&self) -> &str {
        self.label
    }

    async fn release(&self) -> Result<(), McpError> {
        self.session.close();
        Ok(())
    }
}

/// A server object that owns both its session and its transport.
pub(crate) struct ServerResource {
    label: &'static str,
    session: Arc<McpSession>,
}

impl ServerResource {
    pub(crate) fn new(label: &'static str, session: Arc<McpSession>) -> Self {
        Self { label, session }
    }
}

#[async_trait]
impl Release for ServerResource {
    fn label(&self) -> &str {
        self.label
    }

    async fn release(&self) -> Result<(), McpError> {
        self.session.close();
        self.session.transport().close().await
    }
}

/// Resources in acquisition order.
#[derive(Default)]
pub(crate) struct ResourceStack {
    resources: Vec<Box<dyn Release>>,
}

impl ResourceStack {
    pub(crate) fn push(&mut self, resource: impl Release + 'static) {
        tracing::debug!(resource = resource.label(), "Acquired MCP resource");
        self.resources.push(Box::new(resource));
    }

    pub(crate) fn len(&self) -> usize {
        self.resources.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Release everything, most recent first.
    ///
    /// Every resource is attempted even if earlier ones fail. The stack is
    /// empty afterwards.
    pub(crate) async fn release_all(&mut self) -> Vec<ResourceFailure> {
        let mut failures = Vec::new();

        while let Some(resource) = self.resources.pop() {
            match resource.release().await {
                Ok(()) => {
                    tracing::debug!(resource = resource.label(), "Released MCP resource");
                }
                Err(e) => {
                    tracing::warn!(
                        resource = resource.label(),
                        error = %e,
                        "Failed to release MCP resource"
                    );
                    failures.push(ResourceFailure::new(resource.label(), e));
                }
            }
        }

        failures
    }
}

impl std::fmt::Debug for ResourceStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resources.iter().map(|r| r.label()))
            .finish()
    }
}

/// Apply an allow-list to the advertised tools.
///
/// Without an allow-list every tool is kept. With one, the result holds the
/// allow-listed tools in the order the server reported them, and any name the
/// server did not report fails the whole resolution. Duplicate advertisements
/// keep their first occurrence and are logged.
pub(crate) fn resolve_tools(
    advertised: Vec<McpTool>,
    allow_list: Option<&BTreeSet<String>>,
) -> Result<Vec<McpTool>, McpError> {
    let (unique, duplicates) = dedup_tools(advertised);
    if !duplicates.is_empty() {
        tracing::warn!(
            duplicates = ?duplicates,
            "MCP server advertised duplicate tool names; keeping the first of each"
        );
    }

    let Some(allow_list) = allow_list else {
        return Ok(unique);
    };

    let resolved: Vec<McpTool> = unique
        .into_iter()
        .filter(|tool| allow_list.contains(&tool.name))
        .collect();

    if resolved.len() != allow_list.len() {
        let found: Vec<String> = resolved.iter().map(|t| t.name.clone()).collect();
        let missing = allow_list
            .iter()
            .filter(|name| !found.contains(name))
            .cloned()
            .collect();
        return Err(McpError::ToolResolution {
            requested: allow_list.iter().cloned().collect(),
            found,
            missing,
        });
    }

    Ok(resolved)
}

/// Split advertised tools into first occurrences and the names of repeats.
fn dedup_tools(advertised: Vec<McpTool>) -> (Vec<McpTool>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let unique = advertised
        .into_iter()
        .filter(|tool| {
            let first = seen.insert(tool.name.clone());
            if !first {
                duplicates.push(tool.name.clone());
            }
            first
        })
        .collect();
    (unique, duplicates)
}
