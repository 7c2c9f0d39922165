//! MCP clients for the Scene Host
//!
//! Two transports for the same JSON-RPC tool/resource surface:
//! - [`ws::McpWsSession`]: a persistent WebSocket, simplified variant with no
//!   initialize handshake and strict ping-pong request/response ordering.
//! - [`http::McpHttpSession`]: the standard MCP lifecycle over HTTP POST,
//!   with an optional server-sent-event stream for async pushes.

pub mod http;
pub mod ws;

pub use http::{InitializeSummary, McpHttpConfig, McpHttpSession, SessionState};
pub use ws::{McpWsConfig, McpWsSession};
