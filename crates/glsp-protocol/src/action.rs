//! The action sum type and its wire boundary.
//!
//! Every protocol message body is an action object with a `kind`
//! discriminator. Known kinds are modeled as variants of [`Action`];
//! anything else is preserved as [`CustomAction`] so the client can route
//! actions it does not interpret. Validation happens exactly once, at
//! [`Action::from_value`]; after that, code matches on the enum.
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::model::{RejectAction, RequestModelAction, SetModelAction};
use crate::operation::{CompoundOperation, CreateNodeOperation, DeleteElementOperation};
use crate::select::{SelectAction, SelectAllAction};
use crate::status::{ServerMessageAction, ServerStatusAction};
use crate::viewport::{CenterAction, FitToScreenAction};

/// Process-wide request id counter.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Generate the next request id as a decimal string.
///
/// Used by request factories when the caller does not supply an id.
pub fn next_request_id() -> String {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed).to_string()
}

/// An action of a kind this crate does not model.
///
/// The payload keeps every field except `kind`, so re-serialization is
/// lossless.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAction {
    /// The `kind` discriminator.
    pub kind: String,
    /// All remaining fields of the action object.
    pub payload: serde_json::Map<String, Value>,
}

impl CustomAction {
    /// Create a custom action with an empty payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: serde_json::Map::new(),
        }
    }

    /// Set a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

/// The closed set of protocol actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `requestModel` — ask the server for the diagram model.
    RequestModel(RequestModelAction),
    /// `setModel` — replace the client's diagram model.
    SetModel(SetModelAction),
    /// `rejectRequest` — a request failed.
    Reject(RejectAction),
    /// `elementSelected` — change the element selection.
    Select(SelectAction),
    /// `allSelected` — select or deselect everything.
    SelectAll(SelectAllAction),
    /// `center` — center the viewport.
    Center(CenterAction),
    /// `fit` — fit elements to the screen.
    FitToScreen(FitToScreenAction),
    /// `serverStatus` — status bar update from the server.
    ServerStatus(ServerStatusAction),
    /// `serverMessage` — user-visible message from the server.
    ServerMessage(ServerMessageAction),
    /// `createNode` — create a node element.
    CreateNode(CreateNodeOperation),
    /// `deleteElement` — delete elements.
    DeleteElement(DeleteElementOperation),
    /// `compound` — apply operations atomically, in order.
    Compound(CompoundOperation),
    /// Any kind not modeled above, forwarded verbatim.
    Custom(CustomAction),
}

impl Action {
    /// The `kind` discriminator of this action.
    pub fn kind(&self) -> &str {
        match self {
            Action::RequestModel(_) => RequestModelAction::KIND,
            Action::SetModel(_) => SetModelAction::KIND,
            Action::Reject(_) => RejectAction::KIND,
            Action::Select(_) => SelectAction::KIND,
            Action::SelectAll(_) => SelectAllAction::KIND,
            Action::Center(_) => CenterAction::KIND,
            Action::FitToScreen(_) => FitToScreenAction::KIND,
            Action::ServerStatus(_) => ServerStatusAction::KIND,
            Action::ServerMessage(_) => ServerMessageAction::KIND,
            Action::CreateNode(_) => CreateNodeOperation::KIND,
            Action::DeleteElement(_) => DeleteElementOperation::KIND,
            Action::Compound(_) => CompoundOperation::KIND,
            Action::Custom(custom) => &custom.kind,
        }
    }

    /// Whether this action is a model-mutating (undoable) operation.
    pub fn is_operation(&self) -> bool {
        match self {
            Action::CreateNode(_) | Action::DeleteElement(_) | Action::Compound(_) => true,
            Action::Custom(custom) => {
                custom.payload.get("isOperation") == Some(&Value::Bool(true))
            }
            _ => false,
        }
    }

    /// The `requestId` if this action is a request.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Action::RequestModel(request) => Some(&request.request_id),
            Action::Custom(custom) => custom.payload.get("requestId").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The `responseId` if this action is a response.
    pub fn response_id(&self) -> Option<&str> {
        match self {
            Action::SetModel(response) => Some(&response.response_id),
            Action::Reject(reject) => Some(&reject.response_id),
            Action::Custom(custom) => custom.payload.get("responseId").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Whether this action is the response to the request with
    /// `request_id`: the response id must be non-empty and equal.
    pub fn responds_to(&self, request_id: &str) -> bool {
        !request_id.is_empty() && self.response_id() == Some(request_id)
    }

    /// Decode an action from a wire value.
    ///
    /// This is the only place where shapes are validated. Known kinds with
    /// a malformed payload are rejected; unknown kinds succeed as
    /// [`Action::Custom`]. Never panics.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut object) = value else {
            return Err(ProtocolError::NotAnObject(value.to_string()));
        };
        let kind = match object.get("kind").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => return Err(ProtocolError::MissingKind),
        };
        let body = Value::Object(object.clone());
        match kind.as_str() {
            RequestModelAction::KIND => decode(&kind, body).map(Action::RequestModel),
            SetModelAction::KIND => decode(&kind, body).map(Action::SetModel),
            RejectAction::KIND => decode(&kind, body).map(Action::Reject),
            SelectAction::KIND => decode(&kind, body).map(Action::Select),
            SelectAllAction::KIND => decode(&kind, body).map(Action::SelectAll),
            CenterAction::KIND => decode(&kind, body).map(Action::Center),
            FitToScreenAction::KIND => decode(&kind, body).map(Action::FitToScreen),
            ServerStatusAction::KIND => decode(&kind, body).map(Action::ServerStatus),
            ServerMessageAction::KIND => decode(&kind, body).map(Action::ServerMessage),
            CreateNodeOperation::KIND => decode(&kind, body).map(Action::CreateNode),
            DeleteElementOperation::KIND => decode(&kind, body).map(Action::DeleteElement),
            CompoundOperation::KIND => decode(&kind, body).map(Action::Compound),
            _ => {
                object.remove("kind");
                Ok(Action::Custom(CustomAction {
                    kind,
                    payload: object,
                }))
            }
        }
    }

    /// Encode this action as a wire value with its `kind` (and, for
    /// operations, the `isOperation` marker).
    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        let mut object = match self {
            Action::RequestModel(inner) => encode(inner)?,
            Action::SetModel(inner) => encode(inner)?,
            Action::Reject(inner) => encode(inner)?,
            Action::Select(inner) => encode(inner)?,
            Action::SelectAll(inner) => encode(inner)?,
            Action::Center(inner) => encode(inner)?,
            Action::FitToScreen(inner) => encode(inner)?,
            Action::ServerStatus(inner) => encode(inner)?,
            Action::ServerMessage(inner) => encode(inner)?,
            Action::CreateNode(inner) => encode(inner)?,
            Action::DeleteElement(inner) => encode(inner)?,
            Action::Compound(inner) => encode(inner)?,
            Action::Custom(custom) => custom.payload.clone(),
        };
        object.insert("kind".to_string(), Value::String(self.kind().to_string()));
        if self.is_operation() {
            object.insert("isOperation".to_string(), Value::Bool(true));
        }
        Ok(Value::Object(object))
    }
}

fn decode<T: DeserializeOwned>(kind: &str, body: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(body).map_err(|err| ProtocolError::MalformedAction {
        kind: kind.to_string(),
        reason: err.to_string(),
    })
}

fn encode<T: Serialize>(inner: &T) -> Result<serde_json::Map<String, Value>, ProtocolError> {
    match serde_json::to_value(inner)? {
        Value::Object(object) => Ok(object),
        other => Err(ProtocolError::NotAnObject(other.to_string())),
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.to_value().map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Action::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<SelectAction> for Action {
    fn from(action: SelectAction) -> Self {
        Action::Select(action)
    }
}

impl From<RequestModelAction> for Action {
    fn from(action: RequestModelAction) -> Self {
        Action::RequestModel(action)
    }
}

impl From<CompoundOperation> for Action {
    fn from(action: CompoundOperation) -> Self {
        Action::Compound(action)
    }
}

impl From<CustomAction> for Action {
    fn from(action: CustomAction) -> Self {
        Action::Custom(action)
    }
}
