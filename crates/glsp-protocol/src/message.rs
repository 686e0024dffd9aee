//! The action message envelope.
use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Pairs an [`Action`] with the id of the client session it targets.
///
/// `clientId` is routing information only; handlers receive the whole
/// envelope but act on the action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    /// Id of the logical diagram session this action belongs to.
    #[serde(rename = "clientId")]
    pub client_id: String,
    /// The transported action.
    pub action: Action,
}

impl ActionMessage {
    /// Create an envelope for `client_id`.
    pub fn new(client_id: impl Into<String>, action: impl Into<Action>) -> Self {
        Self {
            client_id: client_id.into(),
            action: action.into(),
        }
    }
}
