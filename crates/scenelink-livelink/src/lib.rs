//! LiveLink WebSocket session
//!
//! Maintains one WebSocket connection to the Scene Host's LiveLink server,
//! correlates command/response pairs by request id, and mirrors pushed scene
//! state into a local cache.
//!
//! The protocol is strictly synchronous: one command in flight at a time,
//! every wait bounded by a deadline. Pushes that arrive while a response is
//! pending are queued in arrival order and applied once the request resolves.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use scenelink_core::livelink::{
    Command, CommandEnvelope, CommandResponse, SceneDumpPayload, ServerMessage, SpawnParams,
    TransformParams, classify,
};
use scenelink_core::{Result, SceneLinkError, SceneObject};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for a LiveLink connection
#[derive(Debug, Clone)]
pub struct LiveLinkConfig {
    /// WebSocket endpoint of the Scene Host (default: ws://localhost:8080)
    pub uri: String,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Deadline for each command's response
    pub request_timeout: Duration,
}

impl Default for LiveLinkConfig {
    fn default() -> Self {
        Self {
            uri: "ws://localhost:8080".into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// One WebSocket session against the Scene Host
pub struct LiveLinkSession {
    config: LiveLinkConfig,
    socket: Option<WsStream>,
    request_seq: u64,
    scene_name: String,
    objects: HashMap<String, SceneObject>,
}

impl LiveLinkSession {
    /// Create a session with default configuration
    pub fn new() -> Self {
        Self::with_config(LiveLinkConfig::default())
    }

    /// Create a session with custom configuration
    pub fn with_config(config: LiveLinkConfig) -> Self {
        Self {
            config,
            socket: None,
            request_seq: 0,
            scene_name: String::new(),
            objects: HashMap::new(),
        }
    }

    /// Connect to the Scene Host and ingest the initial scene dump.
    ///
    /// The server opens every connection with a full `scene_dump`; anything
    /// else as the first message is a protocol error.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}", self.config.uri);

        let connected = timeout(
            self.config.connect_timeout,
            connect_async(self.config.uri.as_str()),
        )
        .await
        .map_err(|_| SceneLinkError::Timeout(format!("connection to {}", self.config.uri)))?;
        let (socket, _) = connected
            .map_err(|e| SceneLinkError::Connection(format!("{}: {}", self.config.uri, e)))?;
        self.socket = Some(socket);

        let deadline = Instant::now() + self.config.request_timeout;
        let socket = self.socket.as_mut().ok_or(SceneLinkError::NotConnected)?;
        let first = next_text_frame(socket, deadline, "initial scene dump").await?;

        match classify(&first) {
            Some(ServerMessage::SceneDump { payload }) => {
                self.apply_scene_dump(payload);
                Ok(())
            }
            _ => Err(SceneLinkError::Protocol(
                "expected a scene_dump as the first message".into(),
            )),
        }
    }

    /// Close the socket. Idempotent; safe when already disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None).await;
            info!("Disconnected");
        }
    }

    /// Whether the socket is currently open
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Name of the scene from the last dump
    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    /// Read-only view of the cached object mirror.
    ///
    /// Diagnostic only: entries may be stale and the call touches no
    /// protocol state.
    pub fn objects(&self) -> &HashMap<String, SceneObject> {
        &self.objects
    }

    /// Send a command and wait for its correlated response.
    ///
    /// Interim `scene_dump`/`sync` pushes are queued and drained into the
    /// cache after the response resolves; unknown message types are ignored.
    pub async fn send_command(&mut self, command: Command) -> Result<CommandResponse> {
        let request_id = self.next_request_id();
        let envelope = CommandEnvelope {
            command,
            request_id: request_id.clone(),
        };
        let json = serde_json::to_string(&envelope)?;

        let socket = self.socket.as_mut().ok_or(SceneLinkError::NotConnected)?;
        debug!("[client->host] {}", json);
        socket
            .send(Message::Text(json))
            .await
            .map_err(|e| SceneLinkError::Connection(format!("send failed: {e}")))?;

        let deadline = Instant::now() + self.config.request_timeout;
        let waiting_for = format!("response to {request_id}");
        let mut deferred: Vec<ServerMessage> = Vec::new();

        let response = loop {
            let text = next_text_frame(socket, deadline, &waiting_for).await?;
            match classify(&text) {
                Some(ServerMessage::Response(resp)) if resp.request_id == request_id => break resp,
                Some(ServerMessage::Response(resp)) => {
                    warn!("Skipping response for unknown request {}", resp.request_id);
                }
                Some(push) => deferred.push(push),
                None => debug!("Ignoring unrecognized message: {}", text),
            }
        };

        for push in deferred {
            self.apply_push(push);
        }
        Ok(response)
    }

    /// Spawn a prefab in the scene.
    pub async fn spawn(
        &mut self,
        prefab_key: &str,
        position: Option<[f32; 3]>,
        rotation: Option<[f32; 3]>,
        name: Option<&str>,
    ) -> Result<CommandResponse> {
        self.send_command(Command::Spawn(SpawnParams {
            prefab_key: prefab_key.into(),
            position,
            rotation,
            name: name.map(Into::into),
        }))
        .await
    }

    /// Move, rotate, or scale an object.
    pub async fn transform(
        &mut self,
        uuid: &str,
        position: Option<[f32; 3]>,
        rotation: Option<[f32; 3]>,
        scale: Option<[f32; 3]>,
    ) -> Result<CommandResponse> {
        self.send_command(Command::Transform(TransformParams {
            uuid: uuid.into(),
            position,
            rotation,
            scale,
        }))
        .await
    }

    /// Delete an object.
    pub async fn delete(&mut self, uuid: &str) -> Result<CommandResponse> {
        self.send_command(Command::Delete { uuid: uuid.into() }).await
    }

    /// Round-trip liveness check.
    pub async fn ping(&mut self) -> Result<CommandResponse> {
        self.send_command(Command::Ping {}).await
    }

    /// Ask the server for a fresh scene dump.
    ///
    /// The dump itself arrives as a push and lands in the cache.
    pub async fn request_scene_dump(&mut self) -> Result<CommandResponse> {
        self.send_command(Command::SceneDump {}).await
    }

    fn next_request_id(&mut self) -> String {
        self.request_seq += 1;
        format!("rs-{:04}", self.request_seq)
    }

    fn apply_push(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::SceneDump { payload } => self.apply_scene_dump(payload),
            ServerMessage::Sync { objects } => self.apply_sync(objects),
            ServerMessage::Response(_) => {}
        }
    }

    /// A dump is a full snapshot: clear, then repopulate.
    fn apply_scene_dump(&mut self, payload: SceneDumpPayload) {
        info!(
            "Scene: {} ({} objects)",
            payload.scene_name, payload.object_count
        );
        self.scene_name = payload.scene_name;
        self.objects.clear();
        for obj in payload.objects {
            if !obj.uuid.is_empty() {
                self.objects.insert(obj.uuid.clone(), obj);
            }
        }
    }

    /// Sync merges changed objects without clearing.
    fn apply_sync(&mut self, objects: Vec<SceneObject>) {
        for obj in objects {
            if !obj.uuid.is_empty() {
                self.objects.insert(obj.uuid.clone(), obj);
            }
        }
    }
}

impl Default for LiveLinkSession {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line diagnostic rendering of a cached object.
pub fn format_object(obj: &SceneObject) -> String {
    let name = if obj.name.is_empty() {
        "Unknown"
    } else {
        obj.name.as_str()
    };
    let [x, y, z] = obj.transform.pos;
    format!("[{}] {} @ ({:.1}, {:.1}, {:.1})", obj.uuid, name, x, y, z)
}

/// Read frames until a text message arrives or the deadline expires.
///
/// Control frames are handled by the transport and skipped here.
async fn next_text_frame(socket: &mut WsStream, deadline: Instant, waiting_for: &str) -> Result<String> {
    loop {
        let msg = timeout_at(deadline, socket.next())
            .await
            .map_err(|_| SceneLinkError::Timeout(waiting_for.to_string()))?
            .ok_or_else(|| SceneLinkError::Connection("socket closed".into()))?
            .map_err(|e| SceneLinkError::Connection(e.to_string()))?;

        match msg {
            Message::Text(text) => {
                debug!("[host->client] {}", text);
                return Ok(text);
            }
            Message::Close(_) => {
                return Err(SceneLinkError::Connection(
                    "server closed the connection".into(),
                ));
            }
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenelink_core::Transform;

    fn object(uuid: &str, name: &str, pos: [f32; 3]) -> SceneObject {
        SceneObject {
            uuid: uuid.into(),
            name: name.into(),
            prefab_key: None,
            transform: Transform {
                pos,
                ..Transform::default()
            },
        }
    }

    #[test]
    fn request_ids_are_sequential_and_padded() {
        let mut session = LiveLinkSession::new();

        assert_eq!(session.next_request_id(), "rs-0001");
        assert_eq!(session.next_request_id(), "rs-0002");
        for _ in 0..7 {
            session.next_request_id();
        }
        assert_eq!(session.next_request_id(), "rs-0010");
    }

    #[test]
    fn scene_dump_clears_and_replaces_cache() {
        let mut session = LiveLinkSession::new();
        session.apply_sync(vec![object("old", "Old", [1.0, 1.0, 1.0])]);

        session.apply_scene_dump(SceneDumpPayload {
            scene_name: "Test".into(),
            object_count: 1,
            objects: vec![object("new", "New", [0.0, 0.0, 0.0])],
        });

        assert_eq!(session.scene_name(), "Test");
        assert_eq!(session.objects().len(), 1);
        assert!(session.objects().contains_key("new"));
        assert!(!session.objects().contains_key("old"));
    }

    #[test]
    fn sync_merges_without_clearing() {
        let mut session = LiveLinkSession::new();
        session.apply_sync(vec![object("a", "A", [0.0, 0.0, 0.0])]);
        session.apply_sync(vec![
            object("a", "A", [0.0, 5.0, 0.0]),
            object("b", "B", [1.0, 0.0, 0.0]),
        ]);

        assert_eq!(session.objects().len(), 2);
        assert_eq!(session.objects()["a"].transform.pos, [0.0, 5.0, 0.0]);
    }

    #[test]
    fn sync_skips_entries_without_uuid() {
        let mut session = LiveLinkSession::new();
        session.apply_sync(vec![object("", "Nameless", [0.0, 0.0, 0.0])]);

        assert!(session.objects().is_empty());
    }

    #[test]
    fn format_object_renders_uuid_name_and_position() {
        let line = format_object(&object("abc-1", "Test Cube", [0.0, 2.0, 0.0]));
        assert_eq!(line, "[abc-1] Test Cube @ (0.0, 2.0, 0.0)");

        let anonymous = format_object(&object("u2", "", [1.25, 0.0, -3.5]));
        assert_eq!(anonymous, "[u2] Unknown @ (1.2, 0.0, -3.5)");
    }

    #[tokio::test]
    async fn commands_require_a_connection() {
        let mut session = LiveLinkSession::new();

        let err = session.ping().await.unwrap_err();
        assert!(matches!(err, SceneLinkError::NotConnected));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let mut session = LiveLinkSession::new();
        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_connected());
    }
}
