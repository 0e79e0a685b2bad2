//! Agent-owned collection of MCP server handles.
//!
//! The registry is an explicit object, not a global: each agent creates its
//! own and calls [`McpRegistry::shutdown`] on its way out. Handles are keyed by
//! [`HandleId`] so concurrent setups never contend on anything but the map.

use anyagent_core::{
    AgentFramework, HandleId, LifecycleEventEmitter, LifecycleState, McpError, NoopEmitter,
    ServerSpec, TransportConnector,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};

use crate::connector::ProcessConnector;
use crate::handle::ServerHandle;
use crate::tool::ResolvedTool;

/// A server that finished setup.
#[derive(Debug, Clone)]
pub struct RegisteredServer {
    pub id: HandleId,
    pub tools: Vec<ResolvedTool>,
}

struct Entry {
    framework: AgentFramework,
    handle: Arc<Mutex<ServerHandle>>,
    /// Wakes a setup still in flight so teardown can take the handle.
    cancel: Arc<Notify>,
}

impl Entry {
    /// Cancel any setup in flight, then release everything it opened.
    async fn close(&self, id: HandleId) {
        self.cancel.notify_one();
        if let Err(e) = self.handle.lock().await.teardown().await {
            tracing::warn!(handle = %id, error = %e, "Failed to tear down MCP server");
        }
    }
}

/// Map of live server handles.
#[derive(Clone)]
pub struct McpRegistry {
    handles: Arc<RwLock<HashMap<HandleId, Entry>>>,
    connector: Arc<dyn TransportConnector>,
    emitter: Arc<dyn LifecycleEventEmitter>,
}

impl McpRegistry {
    /// Create a registry that spawns real processes.
    pub fn new() -> Self {
        Self::with_connector(Arc::new(ProcessConnector::new()))
    }

    /// Create a registry that opens transports through `connector`.
    pub fn with_connector(connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            handles: Arc::new(RwLock::new(HashMap::new())),
            connector,
            emitter: Arc::new(NoopEmitter::new()),
        }
    }

    /// Send every handle's lifecycle events to `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn LifecycleEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Create a handle for `spec`, register it and run its setup.
    ///
    /// The handle is registered before setup starts so that a cancelled setup
    /// is still reachable by [`shutdown`](Self::shutdown). A transport failure
    /// removes it again. A tool resolution failure leaves it registered (and
    /// its server running) until it is torn down. Tearing the handle down
    /// while setup is still running cancels the setup, which then fails with
    /// a transport error.
    pub async fn setup(
        &self,
        spec: ServerSpec,
        framework: AgentFramework,
    ) -> Result<RegisteredServer, McpError> {
        let handle = ServerHandle::with_connector(spec, framework, Arc::clone(&self.connector))?
            .with_emitter(Arc::clone(&self.emitter));
        let id = handle.id();
        let server = handle.spec().command.clone();
        let handle = Arc::new(Mutex::new(handle));
        let cancel = Arc::new(Notify::new());

        self.handles.write().await.insert(
            id,
            Entry {
                framework,
                handle: Arc::clone(&handle),
                cancel: Arc::clone(&cancel),
            },
        );

        let result = {
            let mut guard = handle.lock().await;
            tokio::select! {
                result = guard.setup() => result,
                () = cancel.notified() => {
                    tracing::debug!(handle = %id, "MCP server setup cancelled by teardown");
                    Err(McpError::transport(server, "setup cancelled by teardown"))
                }
            }
        };
        match result {
            Ok(tools) => Ok(RegisteredServer { id, tools }),
            Err(e) => {
                if handle.lock().await.state() == LifecycleState::Closed {
                    self.teardown(id).await;
                }
                Err(e)
            }
        }
    }

    /// Tear down and remove a handle.
    ///
    /// Returns whether a handle was registered under `id`. Teardown failures
    /// are logged, never returned.
    pub async fn teardown(&self, id: HandleId) -> bool {
        let Some(entry) = self.handles.write().await.remove(&id) else {
            return false;
        };

        entry.close(id).await;
        true
    }

    /// Tear down every registered handle. Returns how many were removed.
    ///
    /// Setups still in flight are cancelled rather than waited on.
    pub async fn shutdown(&self) -> usize {
        let drained: Vec<(HandleId, Entry)> = self.handles.write().await.drain().collect();

        for (id, entry) in &drained {
            entry.close(*id).await;
        }

        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "MCP registry shut down");
        }
        drained.len()
    }

    /// Tools of a handle, if registered.
    pub async fn tools(&self, id: HandleId) -> Option<Vec<ResolvedTool>> {
        let handle = self.get(id).await?;
        let tools = handle.lock().await.tools().to_vec();
        Some(tools)
    }

    /// State of a handle, if registered.
    pub async fn state(&self, id: HandleId) -> Option<LifecycleState> {
        let handle = self.get(id).await?;
        let state = handle.lock().await.state();
        Some(state)
    }

    /// Every registered handle with its framework and state.
    ///
    /// Handles busy in setup or teardown are reported as
    /// [`LifecycleState::Starting`] rather than waited on.
    pub async fn handles(&self) -> Vec<(HandleId, AgentFramework, LifecycleState)> {
        let handles = self.handles.read().await;
        handles
            .iter()
            .map(|(id, entry)| {
                let state = entry
                    .handle
                    .try_lock()
                    .map_or(LifecycleState::Starting, |h| h.state());
                (*id, entry.framework, state)
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }

    async fn get(&self, id: HandleId) -> Option<Arc<Mutex<ServerHandle>>> {
        self.handles
            .read()
            .await
            .get(&id)
            .map(|entry| Arc::clone(&entry.handle))
    }
}

impl Default for McpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for McpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRegistry").finish_non_exhaustive()
    }
}
