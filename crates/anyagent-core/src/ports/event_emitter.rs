//! Event emitter trait for lifecycle diagnostics.
//!
//! Implementations handle transport details (channels, log sinks, UI bridges).

use crate::events::LifecycleEvent;

/// Trait for emitting lifecycle events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - Caller-specific implementations (channels, telemetry, etc.)
pub trait LifecycleEventEmitter: Send + Sync {
    /// Emit a lifecycle event.
    ///
    /// This method should not block.
    fn emit(&self, event: LifecycleEvent);
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleEventEmitter for NoopEmitter {
    fn emit(&self, _event: LifecycleEvent) {
        // Intentionally do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentFramework, HandleId};
    use std::sync::Arc;

    #[test]
    fn test_arc_noop_emitter() {
        let emitter: Arc<dyn LifecycleEventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(LifecycleEvent::ServerClosed {
            handle: HandleId::new(),
            framework: AgentFramework::Agno,
        });
    }
}
