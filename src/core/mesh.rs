//! Mesh and UV channel data.
//!
//! UV coordinates are stored per face corner ("loop"), so a channel on a
//! mesh always holds exactly [`Mesh::loop_count`] coordinates.

use serde::{Deserialize, Serialize};

/// A named set of 2D texture coordinates, one per loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvChannel {
    /// Channel name (e.g. `UVMap`).
    pub name: String,

    /// Per-loop coordinates.
    pub coords: Vec<[f32; 2]>,
}

impl UvChannel {
    /// Creates a channel from a name and per-loop coordinates.
    #[must_use]
    pub fn new(name: impl Into<String>, coords: Vec<[f32; 2]>) -> Self {
        Self {
            name: name.into(),
            coords,
        }
    }

    /// Number of coordinates in the channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns true if the channel holds no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Polygon mesh data owned by a host object.
///
/// # Examples
///
/// ```
/// use rizom_bridge::core::{Mesh, UvChannel};
///
/// let mut mesh = Mesh::new(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![vec![0, 1, 2, 3]],
/// );
/// assert_eq!(mesh.loop_count(), 4);
/// mesh.set_uv_channel(UvChannel::new("UVMap", vec![[0.0, 0.0]; 4]));
/// assert!(mesh.uv_channel("UVMap").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,

    /// Faces as lists of vertex indices.
    pub faces: Vec<Vec<u32>>,

    /// UV channels in creation order.
    #[serde(default)]
    pub uv_channels: Vec<UvChannel>,

    /// Name of the active UV channel, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_uv_channel: Option<String>,
}

impl Mesh {
    /// Creates a mesh without UV channels.
    #[must_use]
    pub const fn new(positions: Vec<[f32; 3]>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            positions,
            faces,
            uv_channels: Vec::new(),
            active_uv_channel: None,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of face corners.
    #[must_use]
    pub fn loop_count(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    /// Looks up a channel by name.
    #[must_use]
    pub fn uv_channel(&self, name: &str) -> Option<&UvChannel> {
        self.uv_channels.iter().find(|c| c.name == name)
    }

    /// Channel names in order.
    #[must_use]
    pub fn uv_channel_names(&self) -> Vec<&str> {
        self.uv_channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Replaces the channel with the same name, or appends a new one.
    ///
    /// Returns true if an existing channel was replaced.
    pub fn set_uv_channel(&mut self, channel: UvChannel) -> bool {
        if let Some(existing) = self.uv_channels.iter_mut().find(|c| c.name == channel.name) {
            *existing = channel;
            true
        } else {
            self.uv_channels.push(channel);
            false
        }
    }

    /// Removes every channel whose name is not in `keep`.
    ///
    /// Returns the number of removed channels.
    pub fn retain_uv_channels(&mut self, keep: &[&str]) -> usize {
        let before = self.uv_channels.len();
        self.uv_channels.retain(|c| keep.contains(&c.name.as_str()));
        if let Some(active) = &self.active_uv_channel
            && !keep.contains(&active.as_str())
        {
            self.active_uv_channel = None;
        }
        before - self.uv_channels.len()
    }

    /// Makes `name` the active channel if it exists.
    pub fn set_active_uv_channel(&mut self, name: &str) -> bool {
        if self.uv_channel(name).is_some() {
            self.active_uv_channel = Some(name.to_string());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.loop_count(), 6);
    }

    #[test]
    fn test_set_uv_channel_replaces_by_name() {
        let mut mesh = quad();
        assert!(!mesh.set_uv_channel(UvChannel::new("UVMap", vec![[0.0, 0.0]; 6])));
        assert!(!mesh.set_uv_channel(UvChannel::new("Lightmap", vec![[0.5, 0.5]; 6])));
        assert!(mesh.set_uv_channel(UvChannel::new("UVMap", vec![[1.0, 1.0]; 6])));

        assert_eq!(mesh.uv_channel_names(), vec!["UVMap", "Lightmap"]);
        assert_eq!(mesh.uv_channel("UVMap").unwrap().coords[0], [1.0, 1.0]);
    }

    #[test]
    fn test_retain_clears_stale_active() {
        let mut mesh = quad();
        mesh.set_uv_channel(UvChannel::new("UVMap", vec![[0.0, 0.0]; 6]));
        mesh.set_uv_channel(UvChannel::new("Lightmap", vec![[0.0, 0.0]; 6]));
        assert!(mesh.set_active_uv_channel("Lightmap"));

        assert_eq!(mesh.retain_uv_channels(&["UVMap"]), 1);
        assert_eq!(mesh.uv_channel_names(), vec!["UVMap"]);
        assert!(mesh.active_uv_channel.is_none());
    }

    #[test]
    fn test_set_active_unknown_channel() {
        let mut mesh = quad();
        assert!(!mesh.set_active_uv_channel("missing"));
    }
}
