//! MCP JSON-RPC envelope types
//!
//! Shared by both MCP transports (WebSocket and HTTP). Requests carry a
//! per-session integer id; notifications carry none and expect no reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SceneLinkError};

/// Protocol revision sent during initialize
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// MCP JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: i64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: i64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC notification: no id, no response expected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: Value::Null,
        }
    }
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Unwrap into the result payload, surfacing a JSON-RPC error as `Err`.
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(SceneLinkError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or_else(|| {
            SceneLinkError::Protocol("response carried neither result nor error".into())
        })
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Client identity sent during initialize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Server identity extracted from an initialize result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Build the params object for an `initialize` request.
///
/// Capabilities are sent empty: these clients consume tools and resources
/// but advertise none of their own.
pub fn initialize_params(client: &ClientInfo) -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": client,
    })
}

/// Resource URI for one scene object.
pub fn object_uri(scene: &str, uuid: &str) -> String {
    format!("mcp://unity/scenes/{scene}/objects/{uuid}")
}

/// Pull `data.uuid` out of a tool-call result.
///
/// Servers may return a non-object `data`; that yields `None` and callers
/// skip the follow-up read/transform steps.
pub fn extract_spawn_uuid(result: &Value) -> Option<String> {
    result
        .get("data")?
        .as_object()?
        .get("uuid")?
        .as_str()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_with_jsonrpc_version() {
        let request = RpcRequest::new(3, "tools/call", json!({"name": "spawn_object"}));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 3);
        assert_eq!(value["method"], "tools/call");
        assert_eq!(value["params"]["name"], "spawn_object");
    }

    #[test]
    fn notification_has_no_id() {
        let notification = RpcNotification::new("notifications/initialized");

        let value = serde_json::to_value(&notification).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
        assert_eq!(value["method"], "notifications/initialized");
    }

    #[test]
    fn into_result_surfaces_rpc_error() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .unwrap();

        match response.into_result() {
            Err(SceneLinkError::Rpc { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("Expected RPC error, got {:?}", other),
        }
    }

    #[test]
    fn into_result_rejects_empty_response() {
        let response: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1})).unwrap();

        assert!(matches!(
            response.into_result(),
            Err(SceneLinkError::Protocol(_))
        ));
    }

    #[test]
    fn object_uri_matches_resource_pattern() {
        assert_eq!(
            object_uri("MainScene", "u1"),
            "mcp://unity/scenes/MainScene/objects/u1"
        );
    }

    #[test]
    fn spawn_uuid_extracted_from_object_data() {
        let result = json!({"data": {"uuid": "u1", "name": "Cube"}});
        assert_eq!(extract_spawn_uuid(&result).as_deref(), Some("u1"));
    }

    #[test]
    fn spawn_uuid_tolerates_non_object_data() {
        assert!(extract_spawn_uuid(&json!({"data": "spawned"})).is_none());
        assert!(extract_spawn_uuid(&json!({"data": 42})).is_none());
        assert!(extract_spawn_uuid(&json!({})).is_none());
    }
}
