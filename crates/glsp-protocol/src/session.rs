//! Session wire types for the `initialize`/`initializeClientSession`
//! exchange.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The protocol version this crate implements.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Free-form string-keyed arguments attached to requests and actions.
pub type Args = HashMap<String, serde_json::Value>;

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParameters {
    /// Identifies the client application (explicit configuration, one per
    /// client instance).
    pub application_id: String,
    /// Protocol version the client speaks.
    pub protocol_version: String,
    /// Additional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
    /// MCP extension: requested machine-control endpoint. Additive; its
    /// absence leaves the base protocol unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_server: Option<McpServerConfig>,
}

impl InitializeParameters {
    /// Build parameters for `application_id` with the crate's protocol
    /// version.
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            args: None,
            mcp_server: None,
        }
    }
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version the server speaks.
    pub protocol_version: String,
    /// Action kinds the server handles, per diagram type.
    pub server_actions: HashMap<String, Vec<String>>,
    /// MCP extension: the endpoint the server exposes, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_server: Option<McpServerResult>,
}

impl InitializeResult {
    /// Action kinds the server handles for `diagram_type`, if known.
    pub fn server_actions(&self, diagram_type: &str) -> Option<&[String]> {
        self.server_actions.get(diagram_type).map(Vec::as_slice)
    }
}

/// MCP extension block on [`InitializeParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Host the MCP server should bind to.
    pub host: String,
    /// Port the MCP server should bind to.
    pub port: u16,
    /// Optional route prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Optional server name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// MCP extension block on [`InitializeResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerResult {
    /// Name of the running MCP server.
    pub name: String,
    /// URL where the MCP server is reachable.
    pub url: String,
}

/// Parameters of the `initializeClientSession` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeClientSessionParameters {
    /// Id of the logical diagram session to create.
    pub client_session_id: String,
    /// Diagram type the session edits.
    pub diagram_type: String,
    /// Action kinds handled on the client side for this session.
    pub client_action_kinds: Vec<String>,
    /// Additional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

impl InitializeClientSessionParameters {
    /// Build parameters for a session with no extra arguments.
    pub fn new(
        client_session_id: impl Into<String>,
        diagram_type: impl Into<String>,
        client_action_kinds: Vec<String>,
    ) -> Self {
        Self {
            client_session_id: client_session_id.into(),
            diagram_type: diagram_type.into(),
            client_action_kinds,
            args: None,
        }
    }
}

/// Parameters of the `disposeClientSession` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposeClientSessionParameters {
    /// Id of the session to dispose.
    pub client_session_id: String,
    /// Additional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

impl DisposeClientSessionParameters {
    /// Build parameters for `client_session_id`.
    pub fn new(client_session_id: impl Into<String>) -> Self {
        Self {
            client_session_id: client_session_id.into(),
            args: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_parameters_wire_shape() {
        let params = InitializeParameters::new("workflow-editor");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["applicationId"], "workflow-editor");
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert!(value.get("args").is_none());
        assert!(value.get("mcpServer").is_none());
    }

    #[test]
    fn initialize_parameters_with_mcp_block() {
        let mut params = InitializeParameters::new("app");
        params.mcp_server = Some(McpServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            route: None,
            name: Some("glsp-mcp".into()),
        });
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["mcpServer"]["host"], "127.0.0.1");
        assert_eq!(value["mcpServer"]["port"], 3000);
        assert!(value["mcpServer"].get("route").is_none());
    }

    #[test]
    fn initialize_result_roundtrip() {
        let value = serde_json::json!({
            "protocolVersion": "1.0.0",
            "serverActions": {"workflow": ["requestModel", "createNode"]}
        });
        let result: InitializeResult = serde_json::from_value(value).unwrap();
        assert_eq!(
            result.server_actions("workflow"),
            Some(&["requestModel".to_string(), "createNode".to_string()][..])
        );
        assert_eq!(result.server_actions("unknown"), None);
        assert!(result.mcp_server.is_none());
    }

    #[test]
    fn initialize_result_with_mcp_block() {
        let value = serde_json::json!({
            "protocolVersion": "1.0.0",
            "serverActions": {},
            "mcpServer": {"name": "glsp-mcp", "url": "http://127.0.0.1:3000/mcp"}
        });
        let result: InitializeResult = serde_json::from_value(value).unwrap();
        let mcp = result.mcp_server.unwrap();
        assert_eq!(mcp.name, "glsp-mcp");
        assert!(mcp.url.ends_with("/mcp"));
    }

    #[test]
    fn client_session_parameters_wire_shape() {
        let params = InitializeClientSessionParameters::new(
            "session-1",
            "workflow",
            vec!["elementSelected".into()],
        );
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["clientSessionId"], "session-1");
        assert_eq!(value["diagramType"], "workflow");
        assert_eq!(value["clientActionKinds"][0], "elementSelected");
    }

    #[test]
    fn dispose_parameters_wire_shape() {
        let params = DisposeClientSessionParameters::new("session-1");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["clientSessionId"], "session-1");
        assert!(value.get("args").is_none());
    }

    #[test]
    fn initialize_parameters_missing_required_field_fails() {
        let result: Result<InitializeParameters, _> =
            serde_json::from_value(serde_json::json!({"applicationId": "app"}));
        assert!(result.is_err());
    }
}
