//! JSON interchange documents.

use crate::error::{InterchangeError, Result};
use crate::interchange::{Interchange, InterchangeDocument, InterchangeMesh};
use crate::io::{read_file, write_file};
use std::path::Path;

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Interchange codec writing [`InterchangeDocument`]s as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonInterchange;

impl JsonInterchange {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Interchange for JsonInterchange {
    fn extension(&self) -> &'static str {
        "ruvx.json"
    }

    fn write(&self, path: &Path, meshes: &[InterchangeMesh]) -> Result<()> {
        let document = InterchangeDocument {
            format_version: FORMAT_VERSION,
            replace_uv_sets: false,
            meshes: meshes.to_vec(),
        };
        let content = serde_json::to_string(&document).map_err(|e| InterchangeError::Malformed {
            path: path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
        write_file(path, &content)
    }

    fn read(&self, path: &Path) -> Result<InterchangeDocument> {
        let content = read_file(path)?;
        let path_str = path.to_string_lossy().to_string();

        let document: InterchangeDocument =
            serde_json::from_str(&content).map_err(|e| InterchangeError::Malformed {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;

        if document.format_version != FORMAT_VERSION {
            return Err(InterchangeError::UnsupportedVersion {
                path: path_str,
                found: document.format_version,
                expected: FORMAT_VERSION,
            }
            .into());
        }

        for mesh in &document.meshes {
            validate_mesh(&path_str, mesh)?;
        }

        Ok(document)
    }
}

/// Checks the counts a mesh declares against its own geometry.
///
/// UV channel lengths are not checked here; the import reports them per
/// channel.
fn validate_mesh(path: &str, mesh: &InterchangeMesh) -> Result<()> {
    let malformed = |reason: String| InterchangeError::Malformed {
        path: path.to_string(),
        reason,
    };

    if !mesh.positions.is_empty() && mesh.positions.len() != mesh.vertex_count {
        return Err(malformed(format!(
            "mesh '{}' declares {} vertices but has {}",
            mesh.name,
            mesh.vertex_count,
            mesh.positions.len()
        ))
        .into());
    }

    if !mesh.faces.is_empty() {
        let loops: usize = mesh.faces.iter().map(Vec::len).sum();
        if loops != mesh.loop_count {
            return Err(malformed(format!(
                "mesh '{}' declares {} loops but its faces have {loops}",
                mesh.name, mesh.loop_count
            ))
            .into());
        }
    }

    Ok(())
}
