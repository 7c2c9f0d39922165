//! Error types for SceneLink clients

use thiserror::Error;

/// Result type for SceneLink operations
pub type Result<T> = std::result::Result<T, SceneLinkError>;

/// SceneLink client error types
#[derive(Debug, Error)]
pub enum SceneLinkError {
    /// Transport could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// A bounded wait expired before the Scene Host answered
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// Session used before connecting
    #[error("Not connected to the Scene Host")]
    NotConnected,

    /// MCP call attempted before the initialize exchange completed
    #[error("MCP session not initialized")]
    NotInitialized,

    /// MCP initialize exchange failed
    #[error("Initialize handshake failed: {0}")]
    Handshake(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Unexpected message or response shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON-RPC error returned by the Scene Host
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SceneLinkError {
    fn from(err: serde_json::Error) -> Self {
        SceneLinkError::Serialization(err.to_string())
    }
}
