//! Scene object data model
//!
//! The Scene Host owns the authoritative scene graph. These types describe the
//! client's cached mirror of it, refreshed only by `scene_dump` and `sync`
//! pushes and never treated as ground truth.

use serde::{Deserialize, Serialize};

/// Position, rotation, and scale of a scene object.
///
/// Wire format uses abbreviated keys: `{"pos":[x,y,z],"rot":[..],"scale":[..]}`.
/// Missing components default to the origin and unit scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub pos: [f32; 3],
    #[serde(default)]
    pub rot: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: [0.0; 3],
            rot: [0.0; 3],
            scale: unit_scale(),
        }
    }
}

/// A scene object as last reported by the Scene Host.
///
/// Identified by an opaque, externally-assigned UUID string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Present only in spawn-time reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefab_key: Option<String>,
    #[serde(default)]
    pub transform: Transform,
}
