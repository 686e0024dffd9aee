//! glsp — a client framework for the Graphical Language Server Platform
//! protocol.
//!
//! This facade crate re-exports the workspace members:
//!
//! * [`glsp_core`] — disposable and event primitives.
//! * [`glsp_protocol`] — the typed action protocol and session wire types.
//! * [`glsp_client`] — the client state machine, JSON-RPC transport
//!   binding, and feature-module resolution.
pub use glsp_client as client;
pub use glsp_core as core;
pub use glsp_protocol as protocol;

pub use glsp_client::{ClientState, GlspClient, GlspClientOptions};
pub use glsp_protocol::{Action, ActionMessage};
