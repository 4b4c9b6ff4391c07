//! JSON scene document host.
//!
//! A scene document is a small on-disk stand-in for a 3D project: objects
//! with session tokens, their meshes, materials and modifiers, plus the
//! selection and interaction mode. The CLI drives round trips against it.

use crate::core::{
    InteractionMode, Mesh, ObjectId, ObjectInfo, ObjectKind, SelectionSnapshot, UvChannel,
};
use crate::error::{Error, InterchangeError, IoError, PreconditionError, Result};
use crate::host::Host;
use crate::io::{read_file, write_file};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One object of a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Session token.
    pub token: u64,
    /// Object name.
    pub name: String,
    /// Object kind.
    pub kind: ObjectKind,
    /// Mesh data, for mesh objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Mesh>,
    /// Material slot names.
    #[serde(default)]
    pub materials: Vec<String>,
    /// Modifier stack, top first.
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl SceneObject {
    fn id(&self) -> ObjectId {
        ObjectId::new(self.token, self.name.clone())
    }

    fn info(&self) -> ObjectInfo {
        ObjectInfo {
            id: self.id(),
            kind: self.kind,
        }
    }
}

/// Serialized scene contents.
///
/// # Examples
///
/// ```
/// use rizom_bridge::core::{Mesh, ObjectKind};
/// use rizom_bridge::host::SceneDocument;
///
/// let mut doc = SceneDocument::default();
/// let body = doc.add_mesh("Body", Mesh::default());
/// let lamp = doc.add_object("Lamp", ObjectKind::Light);
/// doc.select(&[body.clone(), lamp], Some(&body));
/// assert_eq!(doc.selected.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDocument {
    /// Objects in host order.
    pub objects: Vec<SceneObject>,
    /// Tokens of selected objects.
    pub selected: Vec<u64>,
    /// Token of the active object.
    pub active: Option<u64>,
    /// Interaction mode.
    pub mode: InteractionMode,
    /// Next token to hand out.
    pub next_token: u64,
}

impl SceneDocument {
    /// Adds a non-mesh object.
    pub fn add_object(&mut self, name: &str, kind: ObjectKind) -> ObjectId {
        self.push(name, kind, None)
    }

    /// Adds a mesh object.
    pub fn add_mesh(&mut self, name: &str, mesh: Mesh) -> ObjectId {
        self.push(name, ObjectKind::Mesh, Some(mesh))
    }

    fn push(&mut self, name: &str, kind: ObjectKind, mesh: Option<Mesh>) -> ObjectId {
        self.next_token = self
            .next_token
            .max(self.objects.iter().map(|o| o.token + 1).max().unwrap_or(1));
        let token = self.next_token;
        self.next_token += 1;
        self.objects.push(SceneObject {
            token,
            name: name.to_string(),
            kind,
            mesh,
            materials: Vec::new(),
            modifiers: Vec::new(),
        });
        ObjectId::new(token, name)
    }

    /// Sets selection and active object by token.
    pub fn select(&mut self, ids: &[ObjectId], active: Option<&ObjectId>) {
        self.selected = ids
            .iter()
            .filter(|id| self.object(id.token).is_some())
            .map(|id| id.token)
            .collect();
        self.active = active
            .map(|a| a.token)
            .filter(|t| self.object(*t).is_some());
    }

    /// Renames an object, keeping its token.
    pub fn rename(&mut self, token: u64, name: &str) -> bool {
        self.object_mut(token).is_some_and(|o| {
            o.name = name.to_string();
            true
        })
    }

    /// Deletes an object and drops it from the selection.
    pub fn remove(&mut self, token: u64) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.token != token);
        self.selected.retain(|t| *t != token);
        if self.active == Some(token) {
            self.active = None;
        }
        before != self.objects.len()
    }

    /// Looks up an object by token.
    #[must_use]
    pub fn object(&self, token: u64) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.token == token)
    }

    /// Looks up an object by name.
    #[must_use]
    pub fn object_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    fn object_mut(&mut self, token: u64) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.token == token)
    }

    fn resolve_token(&self, id: &ObjectId) -> Option<u64> {
        if self.object(id.token).is_some() {
            return Some(id.token);
        }
        let mut named = self.objects.iter().filter(|o| o.name == id.name);
        match (named.next(), named.next()) {
            (Some(only), None) => Some(only.token),
            _ => None,
        }
    }

    fn mesh_mut(&mut self, id: &ObjectId) -> Result<&mut Mesh> {
        let token = self.resolve_token(id).ok_or_else(|| Error::Resolution {
            subject: id.to_string(),
        })?;
        self.object_mut(token)
            .and_then(|o| o.mesh.as_mut())
            .ok_or_else(|| {
                InterchangeError::NotAMesh {
                    name: id.name.clone(),
                }
                .into()
            })
    }
}

/// Host backed by a scene document, optionally saved on disk.
#[derive(Debug, Clone)]
pub struct SceneFile {
    path: Option<PathBuf>,
    /// Scene contents.
    pub document: SceneDocument,
}

impl SceneFile {
    /// Opens a saved scene.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let content = read_file(&path)?;
        let document = serde_json::from_str(&content).map_err(|e| IoError::ReadFailed {
            path: path.to_string_lossy().to_string(),
            reason: format!("invalid scene document: {e}"),
        })?;
        Ok(Self {
            path: Some(path),
            document,
        })
    }

    /// Wraps a document that has never been saved.
    #[must_use]
    pub const fn unsaved(document: SceneDocument) -> Self {
        Self {
            path: None,
            document,
        }
    }

    /// Saves the scene to its current location.
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or(PreconditionError::ProjectNotSaved)?;
        self.write_to(path)
    }

    /// Saves the scene to `path` and makes it the scene's location.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = std::path::absolute(path.as_ref())?;
        self.write_to(&path)?;
        self.path = Some(path);
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.document)
            .map_err(|e| IoError::Generic(e.to_string()))?;
        write_file(path, &content)
    }
}

impl Host for SceneFile {
    fn project_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn objects(&self) -> Vec<ObjectInfo> {
        self.document.objects.iter().map(SceneObject::info).collect()
    }

    fn resolve(&self, id: &ObjectId) -> Option<ObjectInfo> {
        self.document
            .resolve_token(id)
            .and_then(|t| self.document.object(t))
            .map(SceneObject::info)
    }

    fn selection(&self) -> SelectionSnapshot {
        let doc = &self.document;
        SelectionSnapshot {
            selected: doc
                .objects
                .iter()
                .filter(|o| doc.selected.contains(&o.token))
                .map(SceneObject::id)
                .collect(),
            active: doc.active.and_then(|t| doc.object(t)).map(SceneObject::id),
            mode: doc.mode,
        }
    }

    fn restore_selection(&mut self, snapshot: &SelectionSnapshot) {
        let doc = &mut self.document;
        let selected: Vec<u64> = snapshot
            .selected
            .iter()
            .filter_map(|id| doc.resolve_token(id))
            .collect();
        let active = snapshot.active.as_ref().and_then(|a| doc.resolve_token(a));
        doc.selected = selected;
        doc.active = active;
        doc.mode = snapshot.mode;
    }

    fn select_only(&mut self, ids: &[ObjectId], active: Option<&ObjectId>) {
        self.document.select(ids, active);
    }

    fn set_mode(&mut self, mode: InteractionMode) {
        self.document.mode = mode;
    }

    fn mesh(&self, id: &ObjectId) -> Option<&Mesh> {
        self.document
            .resolve_token(id)
            .and_then(|t| self.document.object(t))
            .and_then(|o| o.mesh.as_ref())
    }

    fn write_uv_channel(&mut self, id: &ObjectId, channel: UvChannel) -> Result<bool> {
        Ok(self.document.mesh_mut(id)?.set_uv_channel(channel))
    }

    fn retain_uv_channels(&mut self, id: &ObjectId, keep: &[&str]) -> Result<usize> {
        Ok(self.document.mesh_mut(id)?.retain_uv_channels(keep))
    }

    fn set_active_uv_channel(&mut self, id: &ObjectId, name: &str) -> Result<bool> {
        Ok(self.document.mesh_mut(id)?.set_active_uv_channel(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scene() -> (SceneDocument, ObjectId, ObjectId, ObjectId) {
        let mut doc = SceneDocument::default();
        let body = doc.add_mesh("Body", Mesh::default());
        let lamp = doc.add_object("Lamp", ObjectKind::Light);
        let helmet = doc.add_mesh("Helmet", Mesh::default());
        (doc, body, lamp, helmet)
    }

    #[test]
    fn test_tokens_are_unique_and_increasing() {
        let (mut doc, body, lamp, helmet) = scene();
        assert!(body.token < lamp.token && lamp.token < helmet.token);

        doc.remove(helmet.token);
        let crate_id = doc.add_mesh("Crate", Mesh::default());
        assert!(crate_id.token > helmet.token);
    }

    #[test]
    fn test_selection_in_host_order() {
        let (mut doc, body, lamp, helmet) = scene();
        doc.select(&[helmet.clone(), body.clone()], Some(&helmet));
        doc.mode = InteractionMode::Edit;
        let host = SceneFile::unsaved(doc);

        let snapshot = host.selection();
        assert_eq!(snapshot.selected, vec![body, helmet.clone()]);
        assert_eq!(snapshot.active, Some(helmet));
        assert_eq!(snapshot.mode, InteractionMode::Edit);
        assert!(!snapshot.contains(&lamp));
    }

    #[test]
    fn test_restore_skips_deleted_objects() {
        let (mut doc, body, lamp, helmet) = scene();
        doc.select(&[body.clone(), helmet.clone()], Some(&helmet));
        let mut host = SceneFile::unsaved(doc);
        let snapshot = host.selection();

        host.select_only(std::slice::from_ref(&lamp), Some(&lamp));
        host.document.remove(helmet.token);
        host.restore_selection(&snapshot);

        let restored = host.selection();
        assert_eq!(restored.selected, vec![body]);
        assert_eq!(restored.active, None);
    }

    #[test]
    fn test_resolve_by_token_survives_rename() {
        let (mut doc, body, _, _) = scene();
        doc.rename(body.token, "Torso");
        let host = SceneFile::unsaved(doc);

        let info = host.resolve(&body).unwrap();
        assert_eq!(info.id.name, "Torso");
        assert_eq!(info.id.token, body.token);
    }

    #[test]
    fn test_resolve_by_unique_name_when_token_unknown() {
        let (doc, _, _, _) = scene();
        let host = SceneFile::unsaved(doc);

        let stale = ObjectId::new(999, "Helmet");
        assert_eq!(host.resolve(&stale).unwrap().id.name, "Helmet");
    }

    #[test]
    fn test_resolve_ambiguous_name_fails() {
        let (mut doc, _, _, _) = scene();
        doc.add_mesh("Helmet", Mesh::default());
        let host = SceneFile::unsaved(doc);

        assert!(host.resolve(&ObjectId::new(999, "Helmet")).is_none());
    }

    #[test]
    fn test_uv_write_on_non_mesh_fails() {
        let (doc, _, lamp, _) = scene();
        let mut host = SceneFile::unsaved(doc);

        let err = host
            .write_uv_channel(&lamp, UvChannel::new("UVMap", Vec::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Interchange(InterchangeError::NotAMesh { .. })
        ));

        let err = host
            .write_uv_channel(&ObjectId::new(77, "Ghost"), UvChannel::new("UVMap", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn test_save_and_open() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("robot.scene.json");
        let (doc, _, _, _) = scene();

        let mut host = SceneFile::unsaved(doc.clone());
        assert!(host.project_path().is_none());
        assert!(host.save().is_err());

        host.save_as(&path).unwrap();
        assert_eq!(host.project_path(), Some(path.as_path()));

        let reopened = SceneFile::open(&path).unwrap();
        assert_eq!(reopened.document, doc);
    }

    #[test]
    fn test_open_invalid_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.scene.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SceneFile::open(&path).unwrap_err();
        assert!(err.to_string().contains("invalid scene document"));
    }
}
