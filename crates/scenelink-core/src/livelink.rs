//! LiveLink wire protocol
//!
//! Client-to-server commands travel in a `{"type","request_id","payload"}`
//! envelope. Server-to-client messages are classified by their top-level
//! `type` field; unrecognized types are ignored by the receive loop.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scene::SceneObject;

/// Client-to-server command with its payload.
///
/// Optional fields the caller did not supply are omitted from the payload
/// entirely, never serialized as null.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Command {
    Spawn(SpawnParams),
    Transform(TransformParams),
    Delete { uuid: String },
    Ping {},
    SceneDump {},
}

/// Payload for a `spawn` command
#[derive(Debug, Clone, Serialize)]
pub struct SpawnParams {
    pub prefab_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Payload for a `transform` command
#[derive(Debug, Clone, Serialize)]
pub struct TransformParams {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
}

/// Full command envelope as written to the socket
#[derive(Debug, Clone, Serialize)]
pub struct CommandEnvelope {
    #[serde(flatten)]
    pub command: Command,
    pub request_id: String,
}

/// Server-to-client messages, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SceneDump {
        #[serde(default)]
        payload: SceneDumpPayload,
    },
    Response(CommandResponse),
    Sync {
        #[serde(default)]
        objects: Vec<SceneObject>,
    },
}

/// Full-snapshot push of the scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDumpPayload {
    #[serde(default)]
    pub scene_name: String,
    #[serde(default)]
    pub object_count: usize,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

/// Correlated reply to a command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// Classify a raw frame from the Scene Host.
///
/// Returns `None` for unknown message types and malformed frames; the
/// receive loop must ignore those rather than fail.
pub fn classify(text: &str) -> Option<ServerMessage> {
    serde_json::from_str(text).ok()
}
