//! Host application trait definition.
//!
//! The bridge talks to the 3D application only through this trait. The
//! mutation surface is limited to selection, mode and UV channels, so an
//! import cannot touch geometry, modifiers or materials.

use crate::core::{
    InteractionMode, Mesh, ObjectId, ObjectInfo, SelectionSnapshot, UvChannel,
};
use crate::error::Result;
use std::path::Path;

/// Operations the bridge needs from a host application.
pub trait Host {
    /// On-disk location of the project, `None` while unsaved.
    fn project_path(&self) -> Option<&Path>;

    /// All objects in host order.
    fn objects(&self) -> Vec<ObjectInfo>;

    /// Resolves a possibly stale reference to the current object.
    ///
    /// Matches by token. When no object carries the token, an object is
    /// matched by name if exactly one has that name.
    fn resolve(&self, id: &ObjectId) -> Option<ObjectInfo>;

    /// Captures the current selection, active object and mode.
    fn selection(&self) -> SelectionSnapshot;

    /// Restores a snapshot. Objects that no longer exist are skipped.
    fn restore_selection(&mut self, snapshot: &SelectionSnapshot);

    /// Selects exactly `ids`, making `active` the active object.
    fn select_only(&mut self, ids: &[ObjectId], active: Option<&ObjectId>);

    /// Switches the interaction mode.
    fn set_mode(&mut self, mode: InteractionMode);

    /// Mesh data of a mesh object.
    fn mesh(&self, id: &ObjectId) -> Option<&Mesh>;

    /// Writes a whole UV channel, replacing the channel with the same name.
    ///
    /// Returns true if an existing channel was replaced.
    fn write_uv_channel(&mut self, id: &ObjectId, channel: UvChannel) -> Result<bool>;

    /// Removes every UV channel not named in `keep`, returning how many
    /// were removed.
    fn retain_uv_channels(&mut self, id: &ObjectId, keep: &[&str]) -> Result<usize>;

    /// Makes `name` the active UV channel, if the mesh has it.
    fn set_active_uv_channel(&mut self, id: &ObjectId, name: &str) -> Result<bool>;
}
