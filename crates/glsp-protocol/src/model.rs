//! Model request/response actions.
//!
//! `requestModel`/`setModel` form the canonical correlated pair of the
//! protocol: the request carries a `requestId`, the response echoes it back
//! as `responseId`. `rejectRequest` is the generic failure response.
use serde::{Deserialize, Serialize};

use crate::action::next_request_id;
use crate::session::Args;

/// Asks the server for the current diagram model (`requestModel`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestModelAction {
    /// Correlation id echoed back by the response.
    #[serde(rename = "requestId", default)]
    pub request_id: String,
    /// Optional request arguments (e.g. source URI, diagram type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Args>,
}

impl RequestModelAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "requestModel";

    /// Build a request with a freshly generated `requestId`.
    pub fn new(options: Option<Args>) -> Self {
        Self {
            request_id: next_request_id(),
            options,
        }
    }

    /// Build a request with an explicit `requestId`.
    pub fn with_request_id(request_id: impl Into<String>, options: Option<Args>) -> Self {
        Self {
            request_id: request_id.into(),
            options,
        }
    }
}

/// Replaces the client's diagram model (`setModel`).
///
/// Sent by the server either as the response to a `requestModel` (with a
/// matching `responseId`) or spontaneously (empty `responseId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetModelAction {
    /// Correlation id of the originating request, empty if unsolicited.
    #[serde(rename = "responseId", default)]
    pub response_id: String,
    /// The new model root. Opaque to the client core; the rendering layer
    /// interprets it.
    #[serde(rename = "newRoot")]
    pub new_root: serde_json::Value,
}

impl SetModelAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "setModel";

    /// An unsolicited model update.
    pub fn new(new_root: serde_json::Value) -> Self {
        Self {
            response_id: String::new(),
            new_root,
        }
    }

    /// A model update responding to the request with `request_id`.
    pub fn respond_to(request_id: impl Into<String>, new_root: serde_json::Value) -> Self {
        Self {
            response_id: request_id.into(),
            new_root,
        }
    }
}

/// Signals that a request failed (`rejectRequest`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectAction {
    /// Correlation id of the rejected request.
    #[serde(rename = "responseId", default)]
    pub response_id: String,
    /// Human-readable rejection reason.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl RejectAction {
    /// The `kind` discriminator.
    pub const KIND: &'static str = "rejectRequest";

    /// Reject the request with `request_id` for `message`.
    pub fn new(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            response_id: request_id.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// Attach structured detail to the rejection.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_model_generates_unique_ids() {
        let a = RequestModelAction::new(None);
        let b = RequestModelAction::new(None);
        assert!(!a.request_id.is_empty());
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn request_model_explicit_id() {
        let action = RequestModelAction::with_request_id("42", None);
        assert_eq!(action.request_id, "42");
    }

    #[test]
    fn request_model_omits_absent_options() {
        let action = RequestModelAction::with_request_id("1", None);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["requestId"], "1");
        assert!(value.get("options").is_none());
    }

    #[test]
    fn set_model_unsolicited_has_empty_response_id() {
        let action = SetModelAction::new(serde_json::json!({"id": "root"}));
        assert!(action.response_id.is_empty());
    }

    #[test]
    fn set_model_respond_to_echoes_request_id() {
        let action = SetModelAction::respond_to("7", serde_json::json!({"id": "root"}));
        assert_eq!(action.response_id, "7");
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["responseId"], "7");
        assert_eq!(value["newRoot"]["id"], "root");
    }

    #[test]
    fn reject_carries_message_and_detail() {
        let action = RejectAction::new("3", "no such model")
            .with_detail(serde_json::json!({"uri": "missing.diagram"}));
        assert_eq!(action.response_id, "3");
        assert_eq!(action.message, "no such model");
        assert_eq!(action.detail.unwrap()["uri"], "missing.diagram");
    }

    #[test]
    fn reject_omits_absent_detail() {
        let action = RejectAction::new("3", "nope");
        let value = serde_json::to_value(&action).unwrap();
        assert!(value.get("detail").is_none());
    }
}
