//! MCP over HTTP + SSE
//!
//! Implements the standard MCP lifecycle: `initialize` request, `initialized`
//! notification, then tool/resource calls, each as one `POST /mcp` exchange.
//! Failure policy follows the protocol: only a failed initialize aborts the
//! session; every later step is log-and-continue for the caller to decide.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use scenelink_core::mcp::{
    ClientInfo, RpcNotification, RpcRequest, RpcResponse, ServerInfo, initialize_params,
};
use scenelink_core::{Result, SceneLinkError};

/// Lifecycle of the initialize exchange.
///
/// Tool and resource calls are rejected locally until `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Configuration for the HTTP MCP transport
#[derive(Debug, Clone)]
pub struct McpHttpConfig {
    /// Base URL of the Scene Host's MCP endpoint (default: http://localhost:8081)
    pub base_url: String,
    /// Per-request deadline
    pub request_timeout: Duration,
    /// How long to watch the SSE stream before giving up
    pub sse_window: Duration,
    /// Identity advertised during initialize
    pub client_info: ClientInfo,
}

impl Default for McpHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".into(),
            request_timeout: Duration::from_secs(30),
            sse_window: Duration::from_secs(10),
            client_info: ClientInfo {
                name: "scenelink-rs".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
        }
    }
}

/// What a successful initialize exchange reported, for display
#[derive(Debug, Clone)]
pub struct InitializeSummary {
    pub server: ServerInfo,
    /// Capability names advertised by the server
    pub capabilities: Vec<String>,
    /// Whether the `initialized` notification got its expected 204
    pub notified: bool,
}

/// JSON-RPC session over HTTP POST with the full MCP handshake
pub struct McpHttpSession {
    config: McpHttpConfig,
    http: reqwest::Client,
    state: SessionState,
    next_id: i64,
}

impl McpHttpSession {
    /// Create a session with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(McpHttpConfig::default())
    }

    /// Create a session with custom configuration
    pub fn with_config(config: McpHttpConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SceneLinkError::Http(e.to_string()))?;
        Ok(Self {
            config,
            http,
            state: SessionState::Uninitialized,
            next_id: -1,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Liveness probe. Failure carries no protocol weight.
    pub async fn health(&self) -> Result<Value> {
        let url = format!("{}/health", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SceneLinkError::Http(e.to_string()))?;
        info!("Health check: {}", response.status());
        response
            .json()
            .await
            .map_err(|e| SceneLinkError::Http(e.to_string()))
    }

    /// Run the initialize/initialized exchange.
    ///
    /// A response carrying `error` or lacking `result` aborts the handshake
    /// and leaves the session unusable. The `initialized` notification is
    /// best-effort: a non-204 answer is warned about, not fatal.
    pub async fn initialize(&mut self) -> Result<InitializeSummary> {
        self.state = SessionState::Initializing;
        self.next_id += 1;
        let request = RpcRequest::new(
            self.next_id,
            "initialize",
            initialize_params(&self.config.client_info),
        );

        let body = self.post_rpc(&serde_json::to_value(&request)?).await?;
        let mut summary = validate_initialize(&body)?;
        info!(
            "Connected to {} v{}",
            summary.server.name, summary.server.version
        );

        summary.notified = self.notify_initialized().await;
        self.state = SessionState::Ready;
        Ok(summary)
    }

    /// Send a JSON-RPC request; rejected locally before the handshake completes.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<RpcResponse> {
        self.ensure_ready()?;
        self.next_id += 1;
        let request = RpcRequest::new(self.next_id, method, params);
        let body = self.post_rpc(&serde_json::to_value(&request)?).await?;
        serde_json::from_value(body).map_err(Into::into)
    }

    /// List the tools advertised by the Scene Host.
    pub async fn tools_list(&mut self) -> Result<Value> {
        self.request("tools/list", json!({})).await?.into_result()
    }

    /// List the resources advertised by the Scene Host.
    pub async fn resources_list(&mut self) -> Result<Value> {
        self.request("resources/list", json!({}))
            .await?
            .into_result()
    }

    /// Invoke a named tool.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        self.request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?
            .into_result()
    }

    /// Read a resource by URI.
    pub async fn read_resource(&mut self, uri: &str) -> Result<Value> {
        self.request("resources/read", json!({"uri": uri}))
            .await?
            .into_result()
    }

    /// Watch the SSE endpoint for the configured window, feeding each
    /// non-empty line to the callback. Returns how many lines were seen.
    ///
    /// The deadline is captured once before the read loop; a stream the
    /// server never closes still terminates on time.
    pub async fn stream_events(&self, mut on_event: impl FnMut(&str)) -> Result<usize> {
        let url = format!("{}/sse", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.sse_window + Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| SceneLinkError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SceneLinkError::Http(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        let deadline = Instant::now() + self.config.sse_window;
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut seen = 0usize;

        loop {
            let chunk = match timeout_at(deadline, stream.next()).await {
                Err(_) => break,   // window elapsed
                Ok(None) => break, // server closed the stream
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => {
                    debug!("SSE stream ended: {}", e);
                    break;
                }
            };
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    seen += 1;
                    on_event(trimmed);
                }
            }
        }
        Ok(seen)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            Err(SceneLinkError::NotInitialized)
        }
    }

    async fn post_rpc(&self, body: &Value) -> Result<Value> {
        let url = format!("{}/mcp", self.config.base_url);
        debug!("[client->host] {}", body);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SceneLinkError::Http(e.to_string()))?;
        let parsed: Value = response
            .json()
            .await
            .map_err(|e| SceneLinkError::Http(e.to_string()))?;
        debug!("[host->client] {}", parsed);
        Ok(parsed)
    }

    async fn notify_initialized(&self) -> bool {
        let url = format!("{}/mcp", self.config.base_url);
        let notification = RpcNotification::new("notifications/initialized");
        match self.http.post(&url).json(&notification).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::NO_CONTENT => {
                info!("Initialized notification acknowledged");
                true
            }
            Ok(response) => {
                warn!(
                    "Initialized notification answered with {}",
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("Initialized notification failed: {}", e);
                false
            }
        }
    }
}

/// Check an initialize response body and pull out the display fields.
///
/// An `error` member or a missing `result` fails the handshake; the server
/// identity and capability list are read defensively.
pub fn validate_initialize(response: &Value) -> Result<InitializeSummary> {
    if let Some(err) = response.get("error") {
        return Err(SceneLinkError::Handshake(format!(
            "server rejected initialize: {err}"
        )));
    }
    let result = response
        .get("result")
        .ok_or_else(|| SceneLinkError::Handshake("initialize response carried no result".into()))?;

    let server = result
        .get("serverInfo")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let capabilities = result
        .get("capabilities")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();

    Ok(InitializeSummary {
        server,
        capabilities,
        notified: false,
    })
}
