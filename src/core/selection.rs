//! Selection and interaction mode state.

use crate::core::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Object mode. Export and import run in this mode.
    #[default]
    Object,
    /// Mesh edit mode.
    Edit,
    /// Sculpt mode.
    Sculpt,
    /// Vertex paint mode.
    VertexPaint,
    /// Weight paint mode.
    WeightPaint,
    /// Texture paint mode.
    TexturePaint,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Edit => "edit",
            Self::Sculpt => "sculpt",
            Self::VertexPaint => "vertex_paint",
            Self::WeightPaint => "weight_paint",
            Self::TexturePaint => "texture_paint",
        };
        f.write_str(name)
    }
}

/// Snapshot of the host selection, taken before an operation and
/// restored once after it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// Selected objects in host order.
    pub selected: Vec<ObjectId>,

    /// Active object.
    pub active: Option<ObjectId>,

    /// Interaction mode.
    pub mode: InteractionMode,
}

impl SelectionSnapshot {
    /// Returns true if `id` is part of the selection (by token).
    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.selected.iter().any(|s| s.token == id.token)
    }
}
