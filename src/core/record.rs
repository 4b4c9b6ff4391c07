//! Export records.
//!
//! An export record links an exported interchange file back to the host
//! object it came from, together with the selection and mode that were
//! active when the export started.

use crate::core::{InteractionMode, ObjectId, SelectionSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted metadata for one exported object.
///
/// # Examples
///
/// ```
/// use rizom_bridge::core::{ExportRecord, ObjectId, SelectionSnapshot};
/// use std::path::PathBuf;
///
/// let body = ObjectId::new(1, "Body");
/// let record = ExportRecord::new(
///     PathBuf::from("/projects/robot.scene.json"),
///     body.clone(),
///     PathBuf::from("/tmp/rizomuv_bridge/Body.ruvx.json"),
///     &SelectionSnapshot::default(),
/// );
/// assert_eq!(record.object, body);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Project the object belongs to.
    pub project: PathBuf,

    /// Exported object.
    pub object: ObjectId,

    /// Interchange file the object was written to.
    pub source_file: PathBuf,

    /// Unix timestamp of the export.
    pub captured_at: i64,

    /// Selection at export time.
    pub selection: Vec<ObjectId>,

    /// Active object at export time.
    pub active: Option<ObjectId>,

    /// Interaction mode at export time.
    pub mode: InteractionMode,
}

impl ExportRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        project: PathBuf,
        object: ObjectId,
        source_file: PathBuf,
        snapshot: &SelectionSnapshot,
    ) -> Self {
        Self {
            project,
            object,
            source_file,
            captured_at: current_timestamp(),
            selection: snapshot.selected.clone(),
            active: snapshot.active.clone(),
            mode: snapshot.mode,
        }
    }

    /// Returns true if the record belongs to `project`.
    #[must_use]
    pub fn is_for_project(&self, project: &Path) -> bool {
        self.project == project
    }
}

/// Returns current Unix timestamp.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
