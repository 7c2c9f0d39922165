//! # scenelink-core
//!
//! Core types for the SceneLink client protocols.
//!
//! This crate provides the types shared by the LiveLink and MCP clients:
//! - Scene object data model (the client-side cached mirror)
//! - LiveLink wire envelope and message classification
//! - MCP JSON-RPC envelope types and URI helpers
//! - Error taxonomy
//!
//! No I/O lives here; the transport crates build on these types.

pub mod error;
pub mod livelink;
pub mod mcp;
pub mod scene;

pub use error::{Result, SceneLinkError};
pub use scene::{SceneObject, Transform};
