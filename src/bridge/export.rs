//! Export orchestration.

use crate::bridge::{Bridge, SelectionGuard};
use crate::core::{ExportRecord, InteractionMode, ObjectId};
use crate::error::{NegotiationError, PreconditionError, Result};
use crate::host::Host;
use crate::interchange::InterchangeMesh;
use crate::negotiator::{HandoffOutcome, Launcher};
use crate::storage::RecordStore;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Result of one export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportBatch {
    /// Interchange file written.
    pub file: PathBuf,
    /// One record per exported object.
    pub records: Vec<ExportRecord>,
    /// Selected objects that were not meshes.
    pub skipped: Vec<ObjectId>,
    /// How the file reached the external tool.
    pub handoff: HandoffOutcome,
}

impl ExportBatch {
    /// The negotiation error, when the file could not be handed off.
    #[must_use]
    pub const fn handoff_error(&self) -> Option<&NegotiationError> {
        match &self.handoff {
            HandoffOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Exported objects.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectId> {
        self.records.iter().map(|r| &r.object)
    }
}

impl<S: RecordStore, L: Launcher> Bridge<S, L> {
    /// Exports the selected meshes of `host` and hands them to the tool.
    ///
    /// The host selection and mode are restored before returning, whatever
    /// the outcome. A failed handoff is not an error: the file and records
    /// stay in place and [`ExportBatch::handoff_error`] reports it.
    ///
    /// # Errors
    ///
    /// [`PreconditionError::ProjectNotSaved`] when the host project has no
    /// location, [`PreconditionError::NothingToExport`] when no selected
    /// object is a mesh, or an I/O or storage error when the file or the
    /// records cannot be written. Nothing is written on a precondition
    /// failure, and no record is written when the file write fails.
    pub fn export_selection<H: Host>(&mut self, host: &mut H) -> Result<ExportBatch> {
        let project = host
            .project_path()
            .ok_or(PreconditionError::ProjectNotSaved)?
            .to_path_buf();

        let mut guard = SelectionGuard::new(host);
        let snapshot = guard.snapshot().clone();
        info!(
            project = %project.display(),
            selected = snapshot.selected.len(),
            "export started"
        );

        let mut eligible = Vec::new();
        let mut skipped = Vec::new();
        for id in &snapshot.selected {
            match guard.resolve(id) {
                Some(info) if info.kind.is_mesh() && guard.mesh(&info.id).is_some() => {
                    eligible.push(info.id);
                }
                _ => {
                    debug!(object = %id, "skipping non-mesh object");
                    skipped.push(id.clone());
                }
            }
        }

        let active = snapshot
            .active
            .as_ref()
            .and_then(|a| eligible.iter().find(|e| e.token == a.token))
            .or_else(|| eligible.first())
            .cloned()
            .ok_or(PreconditionError::NothingToExport)?;

        guard.set_mode(InteractionMode::Object);
        guard.select_only(&eligible, Some(&active));

        let dir = self.config.export_dir()?;
        let file = dir.join(format!("{}.{}", active.file_stem(), self.codec.extension()));

        let meshes: Vec<InterchangeMesh> = eligible
            .iter()
            .filter_map(|id| guard.mesh(id).map(|m| InterchangeMesh::from_mesh(&id.name, m)))
            .collect();
        self.codec.write(&file, &meshes)?;

        let records: Vec<ExportRecord> = eligible
            .iter()
            .map(|id| ExportRecord::new(project.clone(), id.clone(), file.clone(), &snapshot))
            .collect();
        self.store.record_batch(&records)?;

        let preferred = self.store.last_session_port()?;
        let handoff = self.negotiator.handoff(&file, preferred);
        match &handoff {
            HandoffOutcome::HandedOff { port } => self.store.set_last_session_port(Some(*port))?,
            HandoffOutcome::Launched { .. } => {}
            HandoffOutcome::Failed { error } => {
                warn!(file = %file.display(), %error, "export written but not handed off");
            }
        }

        drop(guard);
        info!(
            file = %file.display(),
            objects = records.len(),
            skipped = skipped.len(),
            "export finished"
        );

        Ok(ExportBatch {
            file,
            records,
            skipped,
            handoff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fixtures::{bridge, bridge_with_exe, quad, scene, temp};
    use crate::core::ObjectKind;
    use crate::error::Error;
    use crate::host::{SceneDocument, SceneFile};
    use crate::interchange::{Interchange, JsonInterchange};
    use crate::negotiator::testing::{Behavior, FakeLauncher, closed_port, config, fake_instance};
    use crate::negotiator::{Negotiator, ToolCommand, ToolReply};
    use crate::storage::MemoryRecordStore;
    use proptest::prelude::*;
    use std::time::Duration;

    #[test]
    fn test_export_body_and_helmet() {
        let dir = temp();
        let mut scene = scene(dir.path());
        let mut bridge = bridge(dir.path());
        let before = scene.host.selection();

        let batch = bridge.export_selection(&mut scene.host).unwrap();

        assert_eq!(batch.file.file_name().unwrap(), "Helmet.ruvx.json");
        assert!(batch.file.starts_with(dir.path().join("tmp").join("rizomuv_bridge")));
        assert!(batch.file.is_file());
        assert_eq!(batch.skipped, vec![scene.lamp.clone()]);
        assert_eq!(
            batch.objects().cloned().collect::<Vec<_>>(),
            vec![scene.body.clone(), scene.helmet.clone()]
        );
        assert!(matches!(batch.handoff, HandoffOutcome::Launched { pid: 4242, .. }));
        assert!(batch.handoff_error().is_none());

        let document = JsonInterchange::new().read(&batch.file).unwrap();
        let names: Vec<&str> = document.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Body", "Helmet"]);

        let project = scene.host.project_path().unwrap().to_path_buf();
        let record = bridge.store().lookup(&project, &scene.body).unwrap().unwrap();
        assert_eq!(record.source_file, batch.file);
        assert_eq!(record.selection, before.selected);
        assert_eq!(record.mode, InteractionMode::Edit);

        assert_eq!(scene.host.selection(), before);
    }

    #[test]
    fn test_unsaved_project_writes_nothing() {
        let dir = temp();
        let mut doc = SceneDocument::default();
        let body = doc.add_mesh("Body", quad());
        doc.select(&[body.clone()], Some(&body));
        let mut host = SceneFile::unsaved(doc);
        let mut bridge = bridge(dir.path());

        let err = bridge.export_selection(&mut host).unwrap_err();
        assert!(matches!(
            err,
            Error::Precondition(PreconditionError::ProjectNotSaved)
        ));
        assert!(!dir.path().join("tmp").exists());
        assert!(bridge.store().list_records().unwrap().is_empty());
    }

    #[test]
    fn test_no_mesh_selected() {
        let dir = temp();
        let mut scene = scene(dir.path());
        scene
            .host
            .select_only(std::slice::from_ref(&scene.lamp), Some(&scene.lamp));
        let before = scene.host.selection();
        let mut bridge = bridge(dir.path());

        let err = bridge.export_selection(&mut scene.host).unwrap_err();
        assert!(matches!(
            err,
            Error::Precondition(PreconditionError::NothingToExport)
        ));
        assert!(!dir.path().join("tmp").exists());
        assert!(bridge.store().list_records().unwrap().is_empty());
        assert_eq!(scene.host.selection(), before);
    }

    #[test]
    fn test_active_falls_back_to_first_mesh() {
        let dir = temp();
        let mut scene = scene(dir.path());
        scene.host.select_only(
            &[scene.lamp.clone(), scene.body.clone(), scene.helmet.clone()],
            Some(&scene.lamp),
        );
        let mut bridge = bridge(dir.path());

        let batch = bridge.export_selection(&mut scene.host).unwrap();
        assert_eq!(batch.file.file_name().unwrap(), "Body.ruvx.json");
    }

    #[test]
    fn test_file_name_is_cleaned() {
        let dir = temp();
        let mut scene = scene(dir.path());
        scene.host.document.rename(scene.helmet.token, "Helmet.001 (old)");
        let mut bridge = bridge(dir.path());

        let batch = bridge.export_selection(&mut scene.host).unwrap();
        assert_eq!(batch.file.file_name().unwrap(), "Helmet_001__old_.ruvx.json");
    }

    #[test]
    fn test_missing_executable_keeps_file_and_records() {
        let dir = temp();
        let mut scene = scene(dir.path());
        let before = scene.host.selection();
        let mut bridge = bridge_with_exe(dir.path(), dir.path().join("missing-rizomuv"));

        let batch = bridge.export_selection(&mut scene.host).unwrap();

        let error = batch.handoff_error().unwrap();
        assert!(matches!(error, NegotiationError::ExecutableMissing { .. }));
        assert_eq!(Error::from(error.clone()).kind(), crate::error::ErrorKind::Configuration);
        assert!(batch.file.is_file());
        assert_eq!(bridge.store().list_records().unwrap().len(), 2);
        assert_eq!(scene.host.selection(), before);
    }

    #[test]
    fn test_handoff_remembers_port() {
        let dir = temp();
        let mut scene = scene(dir.path());
        let (port, commands) = fake_instance(Behavior::Reply(ToolReply::success()));
        let mut cfg = config(vec![port], dir.path().join("missing-rizomuv"));
        cfg.export_root = Some(dir.path().join("tmp"));
        let negotiator = Negotiator::with_launcher(&cfg, FakeLauncher::default());
        let mut bridge = Bridge::with_negotiator(cfg, MemoryRecordStore::new(), negotiator);

        let batch = bridge.export_selection(&mut scene.host).unwrap();

        assert_eq!(batch.handoff, HandoffOutcome::HandedOff { port });
        assert_eq!(bridge.store().last_session_port().unwrap(), Some(port));
        assert_eq!(
            commands.recv_timeout(Duration::from_secs(1)).unwrap(),
            ToolCommand::Load { path: batch.file }
        );
    }

    #[test]
    fn test_reexport_supersedes_record() {
        let dir = temp();
        let mut scene = scene(dir.path());
        let mut bridge = bridge(dir.path());

        bridge.export_selection(&mut scene.host).unwrap();
        scene
            .host
            .select_only(std::slice::from_ref(&scene.body), Some(&scene.body));
        let second = bridge.export_selection(&mut scene.host).unwrap();

        let project = scene.host.project_path().unwrap().to_path_buf();
        let body = bridge.store().lookup(&project, &scene.body).unwrap().unwrap();
        let helmet = bridge.store().lookup(&project, &scene.helmet).unwrap().unwrap();
        assert_eq!(body.source_file, second.file);
        assert_ne!(helmet.source_file, second.file);
        assert_eq!(bridge.store().list_records().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_write_leaves_no_record() {
        let dir = temp();
        let mut scene = scene(dir.path());
        let before = scene.host.selection();
        let mut bridge = bridge(dir.path());
        // A directory where the interchange file should go
        let blocker = dir.path().join("tmp/rizomuv_bridge/Helmet.ruvx.json");
        std::fs::create_dir_all(&blocker).unwrap();

        assert!(bridge.export_selection(&mut scene.host).is_err());
        assert!(bridge.store().list_records().unwrap().is_empty());
        assert!(bridge.negotiator().launcher().launches.borrow().is_empty());
        assert_eq!(scene.host.selection(), before);
    }

    #[test]
    fn test_relative_export_root_yields_absolute_paths() {
        let dir = temp();
        let mut scene = scene(dir.path());
        let root = std::path::PathBuf::from(format!("target/export-root-{}", std::process::id()));
        let mut cfg = config(vec![closed_port()], dir.path().join("rizomuv"));
        std::fs::write(&cfg.executable, b"").unwrap();
        cfg.export_root = Some(root.clone());
        let negotiator = Negotiator::with_launcher(&cfg, FakeLauncher::default());
        let mut bridge = Bridge::with_negotiator(cfg, MemoryRecordStore::new(), negotiator);

        let batch = bridge.export_selection(&mut scene.host).unwrap();
        let launched = bridge.negotiator().launcher().launches.borrow()[0].1.clone();
        let report = bridge.import_from(&mut scene.host, &batch.file).unwrap();
        let _ = std::fs::remove_dir_all(&root);

        assert!(batch.file.is_absolute());
        assert!(batch.records.iter().all(|r| r.source_file.is_absolute()));
        assert_eq!(launched, batch.file);
        assert_eq!(report.updated.len(), 2);
        assert!(report.warnings.is_empty());
    }

    const MODES: [InteractionMode; 6] = [
        InteractionMode::Object,
        InteractionMode::Edit,
        InteractionMode::Sculpt,
        InteractionMode::VertexPaint,
        InteractionMode::WeightPaint,
        InteractionMode::TexturePaint,
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_export_restores_selection(
            kinds in prop::collection::vec(any::<bool>(), 1..6),
            picks in prop::collection::vec(any::<bool>(), 6),
            active in prop::option::of(0usize..6),
            mode in 0usize..6,
            exe_present in any::<bool>(),
        ) {
            let dir = temp();
            let mut doc = SceneDocument::default();
            let ids: Vec<ObjectId> = kinds
                .iter()
                .enumerate()
                .map(|(i, is_mesh)| {
                    if *is_mesh {
                        doc.add_mesh(&format!("Mesh{i}"), quad())
                    } else {
                        doc.add_object(&format!("Empty{i}"), ObjectKind::Empty)
                    }
                })
                .collect();
            let selected: Vec<ObjectId> = ids
                .iter()
                .zip(&picks)
                .filter(|(_, pick)| **pick)
                .map(|(id, _)| id.clone())
                .collect();
            let active = active.and_then(|i| ids.get(i));
            doc.select(&selected, active);
            doc.mode = MODES[mode];

            let mut host = SceneFile::unsaved(doc);
            host.save_as(dir.path().join("scene.json")).unwrap();
            let before = host.selection();

            let exe = if exe_present {
                let exe = dir.path().join("rizomuv");
                std::fs::write(&exe, b"").unwrap();
                exe
            } else {
                dir.path().join("missing")
            };
            let mut bridge = bridge_with_exe(dir.path(), exe);
            let _ = bridge.export_selection(&mut host);

            prop_assert_eq!(host.selection(), before);
        }
    }
}
