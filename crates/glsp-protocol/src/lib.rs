//! glsp-protocol — the typed action protocol of the Graphical Language
//! Server Platform.
//!
//! Actions are the atomic unit of client–server communication. Every
//! action is identified by a `kind` string on the wire; this crate models
//! the known kinds as a closed sum type ([`action::Action`]) with
//! validation at the deserialization boundary, plus the session wire types
//! exchanged during `initialize`/`initializeClientSession`.
pub mod action;
pub mod error;
pub mod message;
pub mod model;
pub mod operation;
pub mod select;
pub mod session;
pub mod status;
pub mod viewport;

// Re-export key types for convenience.
pub use action::{next_request_id, Action, CustomAction};
pub use error::ProtocolError;
pub use message::ActionMessage;
pub use model::{RejectAction, RequestModelAction, SetModelAction};
pub use operation::{CompoundOperation, CreateNodeOperation, DeleteElementOperation, Point};
pub use select::{Deselect, SelectAction, SelectAllAction};
pub use session::{
    Args, DisposeClientSessionParameters, InitializeClientSessionParameters,
    InitializeParameters, InitializeResult, McpServerConfig, McpServerResult, PROTOCOL_VERSION,
};
pub use status::{ServerMessageAction, ServerStatusAction, Severity};
pub use viewport::{CenterAction, FitToScreenAction};
