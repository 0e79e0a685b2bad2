//! Owned lifecycle of one MCP server connection.

use anyagent_core::{
    AgentFramework, HandleId, LifecycleEvent, LifecycleEventEmitter, LifecycleState, McpError,
    McpTool, NoopEmitter, ServerSpec, TeardownError, ToolFiltering, TransportConnector,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::adapter::{FrameworkAdapter, OpenContext, adapter_for};
use crate::client::McpSession;
use crate::connector::ProcessConnector;
use crate::lifecycle::{ResourceStack, resolve_tools};
use crate::tool::ResolvedTool;

/// One MCP server wired into one agent framework.
///
/// Constructing a handle performs no I/O. [`setup`](Self::setup) opens the
/// server and resolves its tools; [`teardown`](Self::teardown) releases
/// everything that was opened, in reverse order. Dropping a handle without
/// tearing it down only logs: child processes are killed on drop, but session
/// shutdown messages are never sent.
pub struct ServerHandle {
    id: HandleId,
    spec: ServerSpec,
    framework: AgentFramework,
    adapter: Box<dyn FrameworkAdapter>,
    connector: Arc<dyn TransportConnector>,
    emitter: Arc<dyn LifecycleEventEmitter>,
    state: LifecycleState,
    resources: ResourceStack,
    session: Option<Arc<McpSession>>,
    tools: Vec<ResolvedTool>,
}

impl ServerHandle {
    /// Create a handle that spawns real processes.
    ///
    /// Fails with [`McpError::DependencyMissing`] if the framework's adapter was
    /// compiled out, and with [`McpError::InvalidSpec`] for an empty command.
    pub fn new(spec: ServerSpec, framework: AgentFramework) -> Result<Self, McpError> {
        Self::with_connector(spec, framework, Arc::new(ProcessConnector::new()))
    }

    /// Create a handle that opens transports through `connector`.
    pub fn with_connector(
        spec: ServerSpec,
        framework: AgentFramework,
        connector: Arc<dyn TransportConnector>,
    ) -> Result<Self, McpError> {
        let adapter = adapter_for(framework)?;
        spec.validate().map_err(McpError::InvalidSpec)?;

        Ok(Self {
            id: HandleId::new(),
            spec,
            framework,
            adapter,
            connector,
            emitter: Arc::new(NoopEmitter::new()),
            state: LifecycleState::Uninitialized,
            resources: ResourceStack::default(),
            session: None,
            tools: Vec::new(),
        })
    }

    /// Send lifecycle events to `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn LifecycleEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub const fn id(&self) -> HandleId {
        self.id
    }

    pub const fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    pub const fn framework(&self) -> AgentFramework {
        self.framework
    }

    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Resolved tools. Empty unless the handle is [`LifecycleState::Ready`].
    pub fn tools(&self) -> &[ResolvedTool] {
        &self.tools
    }

    /// The open session, if setup got far enough to create one.
    ///
    /// Still available after a [`McpError::ToolResolution`] failure so the
    /// server can be inspected before teardown.
    pub const fn session(&self) -> Option<&Arc<McpSession>> {
        self.session.as_ref()
    }

    /// Start the server, run the handshake and resolve tools.
    ///
    /// On a transport failure everything opened so far is released and the
    /// handle ends up [`Closed`](LifecycleState::Closed). On a tool resolution
    /// failure the server is left running and the handle stays
    /// [`Starting`](LifecycleState::Starting) until torn down.
    pub async fn setup(&mut self) -> Result<Vec<ResolvedTool>, McpError> {
        if self.state != LifecycleState::Uninitialized {
            return Err(McpError::InvalidState {
                expected: LifecycleState::Uninitialized,
                actual: self.state,
            });
        }

        self.state = LifecycleState::Starting;
        let command = self.spec.command_line();
        tracing::debug!(
            handle = %self.id,
            framework = %self.framework,
            command = %command,
            "Starting MCP server"
        );
        self.emitter.emit(LifecycleEvent::ServerStarting {
            handle: self.id,
            framework: self.framework,
            command,
        });

        let ctx = OpenContext {
            handle: self.id,
            spec: &self.spec,
            connector: self.connector.as_ref(),
            resources: &mut self.resources,
        };

        let native = match self.adapter.open(ctx).await {
            Ok(native) => native,
            Err(e) => {
                tracing::warn!(
                    handle = %self.id,
                    framework = %self.framework,
                    error = %e,
                    "MCP server setup failed; releasing opened resources"
                );
                // Failures here are already logged per resource
                let _ = self.resources.release_all().await;
                self.state = LifecycleState::Closed;
                self.emit_closed();
                return Err(e);
            }
        };

        self.session = Some(Arc::clone(&native.session));
        let selected = self.select_tools(native.tools)?;

        self.tools = selected
            .into_iter()
            .map(|tool| ResolvedTool::new(tool, self.framework, &native.session))
            .collect();
        self.state = LifecycleState::Ready;

        let names = self.tool_names();
        tracing::info!(
            handle = %self.id,
            framework = %self.framework,
            tool_count = names.len(),
            "MCP server ready"
        );
        self.emitter.emit(LifecycleEvent::ServerReady {
            handle: self.id,
            framework: self.framework,
            tools: names,
        });

        Ok(self.tools.clone())
    }

    /// Release every resource, most recent first.
    ///
    /// Safe on any state; a closed handle is left untouched. Every resource is
    /// attempted even if some fail, and the failures come back together as
    /// [`McpError::Teardown`]. The handle is closed either way.
    pub async fn teardown(&mut self) -> Result<(), McpError> {
        if self.state == LifecycleState::Closed {
            return Ok(());
        }

        tracing::debug!(
            handle = %self.id,
            framework = %self.framework,
            state = %self.state,
            resources = self.resources.len(),
            "Tearing down MCP server"
        );

        self.tools.clear();
        self.session = None;
        let failures = self.resources.release_all().await;
        self.state = LifecycleState::Closed;

        if failures.is_empty() {
            tracing::info!(handle = %self.id, framework = %self.framework, "MCP server closed");
            self.emit_closed();
            return Ok(());
        }

        tracing::warn!(
            handle = %self.id,
            framework = %self.framework,
            failures = failures.len(),
            "MCP server teardown finished with failures"
        );
        self.emitter.emit(LifecycleEvent::TeardownFailed {
            handle: self.id,
            framework: self.framework,
            failures: failures.clone(),
        });
        Err(TeardownError { failures }.into())
    }

    /// Set up, run `f` with the resolved tools, then tear down.
    ///
    /// Teardown runs whether setup or `f` succeeds. Teardown failures are
    /// logged and reported as [`LifecycleEvent::TeardownFailed`], never
    /// returned: once `f` has run its output is always handed back.
    pub async fn scoped<F, Fut, T>(mut self, f: F) -> Result<T, McpError>
    where
        F: FnOnce(Vec<ResolvedTool>) -> Fut,
        Fut: Future<Output = T>,
    {
        let tools = match self.setup().await {
            Ok(tools) => tools,
            Err(e) => {
                if let Err(teardown) = self.teardown().await {
                    tracing::warn!(
                        handle = %self.id,
                        error = %teardown,
                        "Teardown after failed setup also failed"
                    );
                }
                return Err(e);
            }
        };

        let output = f(tools).await;
        if let Err(teardown) = self.teardown().await {
            tracing::warn!(
                handle = %self.id,
                error = %teardown,
                "Teardown after scoped run failed; keeping the run's result"
            );
        }
        Ok(output)
    }

    /// Apply the allow-list according to what the framework's client supports.
    fn select_tools(&self, advertised: Vec<McpTool>) -> Result<Vec<McpTool>, McpError> {
        let Some(requested) = self.spec.allow_list() else {
            let tools = resolve_tools(advertised, None)?;
            let names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
            tracing::info!(
                handle = %self.id,
                framework = %self.framework,
                tools = ?names,
                "No specific tools requested; using all tools from the MCP server"
            );
            self.emitter.emit(LifecycleEvent::ToolsAutoSelected {
                handle: self.id,
                framework: self.framework,
                tools: names,
            });
            return Ok(tools);
        };

        match self.framework.capabilities().filtering {
            ToolFiltering::Shared | ToolFiltering::Native => {
                resolve_tools(advertised, Some(requested)).inspect_err(|e| {
                    tracing::warn!(
                        handle = %self.id,
                        framework = %self.framework,
                        error = %e,
                        "MCP tool resolution failed"
                    );
                })
            }
            ToolFiltering::Unsupported => {
                let requested: Vec<String> = requested.iter().cloned().collect();
                tracing::warn!(
                    handle = %self.id,
                    framework = %self.framework,
                    requested = ?requested,
                    "Tool filtering is not supported by this framework's MCP client; exposing all tools"
                );
                self.emitter.emit(LifecycleEvent::FilteringUnsupported {
                    handle: self.id,
                    framework: self.framework,
                    requested,
                });
                resolve_tools(advertised, None)
            }
        }
    }

    fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    fn emit_closed(&self) {
        self.emitter.emit(LifecycleEvent::ServerClosed {
            handle: self.id,
            framework: self.framework,
        });
    }
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("id", &self.id)
            .field("framework", &self.framework)
            .field("state", &self.state)
            .field("command", &self.spec.command)
            .field("resources", &self.resources)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if !self.resources.is_empty() {
            tracing::warn!(
                handle = %self.id,
                framework = %self.framework,
                resources = self.resources.len(),
                "MCP server handle dropped without teardown; child processes will be killed"
            );
        }
    }
}
