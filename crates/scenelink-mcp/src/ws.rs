//! MCP over a persistent WebSocket
//!
//! Simplified transport variant: no initialize handshake, and the server
//! answers every request before the next is sent, so a single receive
//! follows every send and no id-matching loop is needed.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use scenelink_core::mcp::{RpcRequest, RpcResponse};
use scenelink_core::{Result, SceneLinkError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the WebSocket MCP transport
#[derive(Debug, Clone)]
pub struct McpWsConfig {
    /// WebSocket endpoint of the Scene Host (default: ws://localhost:8080)
    pub uri: String,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Deadline for each request's response
    pub request_timeout: Duration,
}

impl Default for McpWsConfig {
    fn default() -> Self {
        Self {
            uri: "ws://localhost:8080".into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-RPC session over a persistent WebSocket
pub struct McpWsSession {
    config: McpWsConfig,
    socket: Option<WsStream>,
    next_id: i64,
}

impl McpWsSession {
    /// Create a session with default configuration
    pub fn new() -> Self {
        Self::with_config(McpWsConfig::default())
    }

    /// Create a session with custom configuration
    pub fn with_config(config: McpWsConfig) -> Self {
        Self {
            config,
            socket: None,
            next_id: 0,
        }
    }

    /// Open the socket.
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
        Ok(())
    }

    /// Close the socket. Idempotent.
    pub async fn disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None).await;
            info!("Disconnected");
        }
    }

    /// Send one request and read the next frame as its response.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<RpcResponse> {
        self.next_id += 1;
        let request = RpcRequest::new(self.next_id, method, params);
        let json = serde_json::to_string(&request)?;

        let socket = self.socket.as_mut().ok_or(SceneLinkError::NotConnected)?;
        debug!("[client->host] {}", json);
        socket
            .send(Message::Text(json))
            .await
            .map_err(|e| SceneLinkError::Connection(format!("send failed: {e}")))?;

        let deadline = Instant::now() + self.config.request_timeout;
        let text = loop {
            let msg = timeout_at(deadline, socket.next())
                .await
                .map_err(|_| SceneLinkError::Timeout(format!("response to {method}")))?
                .ok_or_else(|| SceneLinkError::Connection("socket closed".into()))?
                .map_err(|e| SceneLinkError::Connection(e.to_string()))?;
            match msg {
                Message::Text(text) => break text,
                Message::Close(_) => {
                    return Err(SceneLinkError::Connection(
                        "server closed the connection".into(),
                    ));
                }
                _ => continue,
            }
        };

        debug!("[host->client] {}", text);
        serde_json::from_str(&text).map_err(Into::into)
    }

    /// List the tools advertised by the Scene Host.
    pub async fn tools_list(&mut self) -> Result<Value> {
        self.call("tools/list", json!({})).await?.into_result()
    }

    /// List the resources advertised by the Scene Host.
    pub async fn resources_list(&mut self) -> Result<Value> {
        self.call("resources/list", json!({})).await?.into_result()
    }

    /// Invoke a named tool.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        self.call("tools/call", json!({"name": name, "arguments": arguments}))
            .await?
            .into_result()
    }

    /// Read a resource by URI.
    pub async fn read_resource(&mut self, uri: &str) -> Result<Value> {
        self.call("resources/read", json!({"uri": uri}))
            .await?
            .into_result()
    }
}

impl Default for McpWsSession {
    fn default() -> Self {
        Self::new()
    }
}
