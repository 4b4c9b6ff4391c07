//! In-memory record store.
//!
//! Keeps records for the lifetime of one host session. Used when the host
//! does not want records on disk, and in tests.

use crate::core::{ExportRecord, ObjectId};
use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use crate::storage::traits::{RecordStore, StoreStats, interchange_stem, sort_for_resolution};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Record store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    /// Records keyed by project and token, with their insertion sequence.
    records: BTreeMap<(PathBuf, u64), (u64, ExportRecord)>,
    next_seq: u64,
    last_port: Option<u16>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn by_recency(&self) -> Vec<&(u64, ExportRecord)> {
        let mut entries: Vec<_> = self.records.values().collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries
    }
}

impl RecordStore for MemoryRecordStore {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_initialized(&self) -> Result<bool> {
        Ok(true)
    }

    fn reset(&mut self) -> Result<()> {
        self.records.clear();
        self.last_port = None;
        Ok(())
    }

    fn record(&mut self, record: &ExportRecord) -> Result<()> {
        self.next_seq += 1;
        self.records.insert(
            (record.project.clone(), record.object.token),
            (self.next_seq, record.clone()),
        );
        Ok(())
    }

    fn forget_file(&mut self, file: &Path) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|_, (_, r)| r.source_file != file);
        Ok(before - self.records.len())
    }

    fn lookup(&self, project: &Path, object: &ObjectId) -> Result<Option<ExportRecord>> {
        Ok(self
            .records
            .get(&(project.to_path_buf(), object.token))
            .map(|(_, r)| r.clone()))
    }

    fn resolve_from_file(&self, file: &Path) -> Result<Vec<ExportRecord>> {
        let mut records: Vec<ExportRecord> = self
            .records
            .values()
            .filter(|(_, r)| r.source_file == file)
            .map(|(_, r)| r.clone())
            .collect();

        if records.is_empty()
            && let Some(stem) = interchange_stem(file)
        {
            records = self
                .records
                .values()
                .filter(|(_, r)| r.object.file_stem() == stem)
                .map(|(_, r)| r.clone())
                .collect();
        }

        sort_for_resolution(&mut records);
        Ok(records)
    }

    fn list_records(&self) -> Result<Vec<ExportRecord>> {
        Ok(self.by_recency().into_iter().map(|(_, r)| r.clone()).collect())
    }

    fn latest_file_for_project(&self, project: &Path) -> Result<Option<PathBuf>> {
        Ok(self
            .by_recency()
            .into_iter()
            .find(|(_, r)| r.is_for_project(project))
            .map(|(_, r)| r.source_file.clone()))
    }

    fn last_session_port(&self) -> Result<Option<u16>> {
        Ok(self.last_port)
    }

    fn set_last_session_port(&mut self, port: Option<u16>) -> Result<()> {
        self.last_port = port;
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let projects: HashSet<_> = self.records.values().map(|(_, r)| &r.project).collect();
        let files: HashSet<_> = self.records.values().map(|(_, r)| &r.source_file).collect();
        Ok(StoreStats {
            record_count: self.records.len(),
            project_count: projects.len(),
            file_count: files.len(),
            last_session_port: self.last_port,
            schema_version: CURRENT_SCHEMA_VERSION,
            db_size: None,
        })
    }
}
