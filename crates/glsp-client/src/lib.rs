//! glsp-client — GLSP client runtime.
//!
//! This crate binds the action protocol to a JSON-RPC message connection
//! and manages the logical client lifecycle: connection resolution,
//! the `initialize` handshake, per-session setup/teardown, and routing of
//! incoming action messages to registered handlers. It also provides the
//! feature-module resolution used to assemble a client configuration.
pub mod client;
pub mod codec;
pub mod connection;
pub mod container;
pub mod error;

// Re-export key types for convenience.
pub use client::{ClientState, GlspClient, GlspClientOptions};
pub use codec::{FrameReader, FrameWriter, RpcFailure, RpcIncoming};
pub use connection::{ConnectionProvider, JsonRpcConnection};
pub use container::{
    resolve_container_configuration, ContainerConfiguration, ContainerError, FeatureId, Module,
    ModuleDirective,
};
pub use error::ClientError;
