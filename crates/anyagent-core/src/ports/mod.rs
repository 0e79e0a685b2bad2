//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the lifecycle logic expects from
//! infrastructure. They contain no implementation details and use only domain
//! types.
//!
//! # Design Rules
//!
//! - No `tokio::process` or HTTP client types in any signature
//! - Transports speak JSON-RPC values, not bytes
//! - Connectors are the only place a process is spawned or a socket opened

pub mod event_emitter;
pub mod transport;

pub use event_emitter::{LifecycleEventEmitter, NoopEmitter};
pub use transport::{LaunchTarget, McpTransport, TransportConnector};
