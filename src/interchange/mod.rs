//! Interchange codecs.
//!
//! The interchange file is the serialization exchanged with the external
//! tool. Its format belongs to the host, so the bridge only sees it
//! through the [`Interchange`] trait: write a set of named meshes, read
//! back meshes with their UV channels.

mod json;

pub use json::{FORMAT_VERSION, JsonInterchange};

use crate::core::{Mesh, UvChannel};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A mesh as written to or read from an interchange file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterchangeMesh {
    /// Object name at export time.
    pub name: String,

    /// Number of vertices.
    pub vertex_count: usize,

    /// Number of face corners.
    pub loop_count: usize,

    /// Vertex positions.
    #[serde(default)]
    pub positions: Vec<[f32; 3]>,

    /// Faces as vertex index lists.
    #[serde(default)]
    pub faces: Vec<Vec<u32>>,

    /// UV channels in file order.
    #[serde(default)]
    pub uv_channels: Vec<UvChannel>,

    /// Active channel, if the file names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_uv_channel: Option<String>,
}

impl InterchangeMesh {
    /// Captures a host mesh under `name`.
    #[must_use]
    pub fn from_mesh(name: &str, mesh: &Mesh) -> Self {
        Self {
            name: name.to_string(),
            vertex_count: mesh.vertex_count(),
            loop_count: mesh.loop_count(),
            positions: mesh.positions.clone(),
            faces: mesh.faces.clone(),
            uv_channels: mesh.uv_channels.clone(),
            active_uv_channel: mesh.active_uv_channel.clone(),
        }
    }
}

/// Contents of one interchange file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterchangeDocument {
    /// Format version.
    pub format_version: u32,

    /// When true, UV channels absent from the file are removed on import.
    #[serde(default)]
    pub replace_uv_sets: bool,

    /// Meshes in the file.
    pub meshes: Vec<InterchangeMesh>,
}

impl InterchangeDocument {
    /// Finds a mesh by its export name.
    #[must_use]
    pub fn mesh(&self, name: &str) -> Option<&InterchangeMesh> {
        self.meshes.iter().find(|m| m.name == name)
    }
}

/// A serialization of meshes and their UV channels.
pub trait Interchange {
    /// File extension, without the leading dot.
    fn extension(&self) -> &'static str;

    /// Writes `meshes` to `path` as one file.
    fn write(&self, path: &Path, meshes: &[InterchangeMesh]) -> Result<()>;

    /// Reads an interchange file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be read, and a malformed
    /// error when it cannot be decoded.
    fn read(&self, path: &Path) -> Result<InterchangeDocument>;
}
