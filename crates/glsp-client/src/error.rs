//! Client error types.
use std::time::Duration;

use crate::client::ClientState;

/// Errors from client and transport operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An operation was called while the client was not `Running`.
    #[error("operation requires a running client (current state: {0:?})")]
    NotRunning(ClientState),

    /// The client has been stopped and cannot be restarted.
    #[error("client has already been stopped")]
    Stopped,

    /// No server connection was configured before `start`.
    #[error("no server connection configured")]
    NoConnection,

    /// The configured connection did not resolve before the startup
    /// timeout.
    #[error("server connection did not resolve within {0:?}")]
    StartTimeout(Duration),

    /// A concurrent start attempt ended in a non-running state.
    #[error("start attempt failed (client state: {0:?})")]
    StartFailed(ClientState),

    /// A request did not receive a response in time.
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    /// The connection closed while an operation was in flight.
    #[error("connection closed")]
    ConnectionClosed,

    /// The server answered a request with a JSON-RPC error.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// The error code.
        code: i64,
        /// The error message.
        message: String,
    },

    /// A wire frame could not be decoded.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// I/O error on the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message failed action-protocol validation.
    #[error("malformed message: {0}")]
    Protocol(#[from] glsp_protocol::ProtocolError),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
