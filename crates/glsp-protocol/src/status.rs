//! Server status and message notification actions.
use serde::{Deserialize, Serialize};

/// Severity of a server status or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Clears a previous status.
    None,
    /// Informational.
    Info,
    /// Something the user should know about.
    Warning,
    /// Something went wrong.
    Error,
    /// Something went wrong and the session is unusable.
    Fatal,
    /// Status that should not be surfaced to the user.
    Ok,
}

/// Updates the client's status bar (`serverStatus`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatusAction {
    /// How severe the status is.
    pub severity: Severity,
    /// The status text.
    pub message: String,
}

impl ServerStatusAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "serverStatus";

    /// Create a status with the given severity and text.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Shows a message to the user (`serverMessage`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessageAction {
    /// How severe the message is.
    pub severity: Severity,
    /// The message text.
    pub message: String,
    /// Optional long-form details (e.g. a stack trace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ServerMessageAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "serverMessage";

    /// Create a message with the given severity and text.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            details: None,
        }
    }

    /// Attach long-form details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
