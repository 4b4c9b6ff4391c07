//! Import orchestration.

use crate::bridge::{Bridge, SelectionGuard};
use crate::core::{InteractionMode, ObjectId};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::interchange::InterchangeMesh;
use crate::negotiator::Launcher;
use crate::storage::RecordStore;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// UV changes applied to one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectUpdate {
    /// Updated object, as currently named in the host.
    pub object: ObjectId,
    /// Channels written from the file.
    pub channels_updated: usize,
    /// Channels removed because the file replaced the full UV set.
    pub channels_removed: usize,
}

/// Something an import skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum ImportWarning {
    /// No export record matches the file.
    Unattributed {
        /// Imported file.
        file: PathBuf,
    },
    /// The record belongs to a different project than the open one.
    ForeignProject {
        /// Exported object.
        object: ObjectId,
        /// Project the record was made in.
        project: PathBuf,
    },
    /// The exported object no longer exists or is no longer a mesh.
    MissingTarget {
        /// Exported object.
        object: ObjectId,
    },
    /// The file has no mesh for the exported object.
    MissingFromFile {
        /// Exported object.
        object: ObjectId,
    },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unattributed { file } => {
                write!(f, "{} does not match any export", file.display())
            }
            Self::ForeignProject { object, project } => {
                write!(f, "{object} was exported from {}", project.display())
            }
            Self::MissingTarget { object } => {
                write!(f, "{object} no longer exists or is not a mesh")
            }
            Self::MissingFromFile { object } => write!(f, "{object} is not in the file"),
        }
    }
}

/// An object whose UVs could not be fully applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    /// Target object.
    pub object: ObjectId,
    /// What went wrong.
    pub reason: String,
    /// Channels written before the failure.
    pub channels_updated: usize,
}

/// Outcome of importing one interchange file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Imported file.
    pub file: PathBuf,
    /// Objects that received UVs.
    pub updated: Vec<ObjectUpdate>,
    /// Records that were skipped.
    pub warnings: Vec<ImportWarning>,
    /// Objects that failed.
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// True when at least one object failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Converts a partial import into [`Error::PartialFailure`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_partial() {
            return Err(Error::PartialFailure {
                file: self.file.display().to_string(),
                updated: self.updated.len(),
                failed: self.failures.len(),
            });
        }
        Ok(self)
    }
}

impl<S: RecordStore, L: Launcher> Bridge<S, L> {
    /// Applies the UV channels of an interchange file to the objects it was
    /// exported from.
    ///
    /// Only UV channels are written. Per-object problems are reported in
    /// the [`ImportReport`] rather than aborting the import, and the host
    /// selection and mode are restored before returning.
    ///
    /// # Errors
    ///
    /// An I/O or interchange error when the file cannot be read or decoded,
    /// or a storage error when the records cannot be queried. A file with
    /// no matching record is not an error.
    pub fn import_from<H: Host>(&mut self, host: &mut H, path: &Path) -> Result<ImportReport> {
        let file = std::path::absolute(path)?;
        let records = self.store.resolve_from_file(&file)?;
        let mut report = ImportReport {
            file: file.clone(),
            ..ImportReport::default()
        };

        if records.is_empty() {
            warn!(file = %file.display(), "no export record matches file");
            report.warnings.push(ImportWarning::Unattributed { file });
            return Ok(report);
        }

        let document = self.codec.read(&file)?;
        let project = host.project_path().map(Path::to_path_buf);
        info!(file = %file.display(), records = records.len(), "import started");

        let mut guard = SelectionGuard::new(host);
        guard.set_mode(InteractionMode::Object);

        for record in records {
            let object = record.object;
            if project.as_deref() != Some(record.project.as_path()) {
                warn!(%object, project = %record.project.display(), "record from another project");
                report.warnings.push(ImportWarning::ForeignProject {
                    object,
                    project: record.project,
                });
                continue;
            }

            let Some(target) = guard.resolve(&object).filter(|info| info.kind.is_mesh()) else {
                warn!(%object, "export target missing");
                report.warnings.push(ImportWarning::MissingTarget { object });
                continue;
            };

            let Some(source) = document.mesh(&object.name) else {
                warn!(%object, "object missing from file");
                report.warnings.push(ImportWarning::MissingFromFile { object });
                continue;
            };

            match apply_uvs(&mut *guard, &target.id, source, document.replace_uv_sets) {
                Ok(update) => {
                    info!(
                        object = %update.object,
                        updated = update.channels_updated,
                        removed = update.channels_removed,
                        "UVs applied"
                    );
                    report.updated.push(update);
                }
                Err(failure) => {
                    warn!(object = %failure.object, reason = %failure.reason, "UV import failed");
                    report.failures.push(failure);
                }
            }
        }

        drop(guard);
        info!(
            updated = report.updated.len(),
            warnings = report.warnings.len(),
            failures = report.failures.len(),
            "import finished"
        );
        Ok(report)
    }
}

/// Copies every channel of `source` onto `target`.
fn apply_uvs<H: Host>(
    host: &mut H,
    target: &ObjectId,
    source: &InterchangeMesh,
    replace_uv_sets: bool,
) -> std::result::Result<ObjectUpdate, ImportFailure> {
    let failure = |reason: String, channels_updated: usize| ImportFailure {
        object: target.clone(),
        reason,
        channels_updated,
    };

    let Some(mesh) = host.mesh(target) else {
        return Err(failure("object has no mesh data".to_string(), 0));
    };
    let (vertices, loops) = (mesh.vertex_count(), mesh.loop_count());
    if vertices != source.vertex_count || loops != source.loop_count {
        return Err(failure(
            format!(
                "topology changed: object has {vertices} vertices and {loops} loops, file has {} and {}",
                source.vertex_count, source.loop_count
            ),
            0,
        ));
    }

    let mut channels_updated = 0;
    for channel in &source.uv_channels {
        if channel.len() != loops {
            return Err(failure(
                format!(
                    "UV channel '{}' has {} coordinates, expected {loops}",
                    channel.name,
                    channel.len()
                ),
                channels_updated,
            ));
        }
        host.write_uv_channel(target, channel.clone())
            .map_err(|e| failure(e.to_string(), channels_updated))?;
        channels_updated += 1;
    }

    let mut channels_removed = 0;
    if replace_uv_sets {
        let keep: Vec<&str> = source.uv_channels.iter().map(|c| c.name.as_str()).collect();
        channels_removed = host
            .retain_uv_channels(target, &keep)
            .map_err(|e| failure(e.to_string(), channels_updated))?;
    }

    if let Some(active) = &source.active_uv_channel {
        host.set_active_uv_channel(target, active)
            .map_err(|e| failure(e.to_string(), channels_updated))?;
    }

    Ok(ObjectUpdate {
        object: target.clone(),
        channels_updated,
        channels_removed,
    })
}
