//! MCP server lifecycle events.

use serde::{Deserialize, Serialize};

use crate::domain::{AgentFramework, HandleId};
use crate::error::ResourceFailure;

/// Diagnostic events emitted while a server handle moves through its
/// lifecycle.
///
/// Events are informational. Nothing in the lifecycle waits on or reacts to
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Setup began; the transport is about to be opened.
    ServerStarting {
        handle: HandleId,
        framework: AgentFramework,
        command: String,
    },
    /// No allow-list was given, so every advertised tool was selected.
    ToolsAutoSelected {
        handle: HandleId,
        framework: AgentFramework,
        tools: Vec<String>,
    },
    /// An allow-list was given but the framework's client cannot filter.
    FilteringUnsupported {
        handle: HandleId,
        framework: AgentFramework,
        requested: Vec<String>,
    },
    /// Setup completed and tools are exposed.
    ServerReady {
        handle: HandleId,
        framework: AgentFramework,
        tools: Vec<String>,
    },
    /// Every resource was released.
    ServerClosed {
        handle: HandleId,
        framework: AgentFramework,
    },
    /// Teardown finished but some resources failed to close.
    TeardownFailed {
        handle: HandleId,
        framework: AgentFramework,
        failures: Vec<ResourceFailure>,
    },
}

impl LifecycleEvent {
    /// Handle the event refers to.
    pub const fn handle(&self) -> HandleId {
        match self {
            Self::ServerStarting { handle, .. }
            | Self::ToolsAutoSelected { handle, .. }
            | Self::FilteringUnsupported { handle, .. }
            | Self::ServerReady { handle, .. }
            | Self::ServerClosed { handle, .. }
            | Self::TeardownFailed { handle, .. } => *handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let handle = HandleId::new();
        let event = LifecycleEvent::ToolsAutoSelected {
            handle,
            framework: AgentFramework::Smolagents,
            tools: vec!["search".into()],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tools_auto_selected");
        assert_eq!(json["framework"], "smolagents");
        assert_eq!(event.handle(), handle);
    }
}
