//! Record store trait definition.
//!
//! Defines the interface for metadata store backends, enabling
//! pluggable storage implementations.

use crate::core::{ExportRecord, ObjectId};
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Trait for export record backends.
///
/// Records are keyed by project and object token. Writing a record for an
/// object that already has one supersedes it (last write wins).
pub trait RecordStore {
    /// Initializes storage (creates schema, runs migrations).
    ///
    /// Should be idempotent - safe to call multiple times.
    fn init(&mut self) -> Result<()>;

    /// Checks if storage is initialized.
    fn is_initialized(&self) -> Result<bool>;

    /// Deletes all records and session state but preserves the schema.
    fn reset(&mut self) -> Result<()>;

    // ==================== Record Operations ====================

    /// Persists a record, overwriting any prior record for the same object.
    fn record(&mut self, record: &ExportRecord) -> Result<()>;

    /// Deletes every record whose source file is `file`.
    ///
    /// Returns the number of records removed.
    fn forget_file(&mut self, file: &Path) -> Result<usize>;

    /// Persists every record of one export batch, or none of them.
    ///
    /// Rewriting an interchange file supersedes whatever was recorded for
    /// it before, from any project, so records for the batch's files are
    /// forgotten first. The default implementation writes records one by
    /// one; backends with transactions should override it.
    fn record_batch(&mut self, records: &[ExportRecord]) -> Result<()> {
        for file in batch_files(records) {
            self.forget_file(file)?;
        }
        for record in records {
            self.record(record)?;
        }
        Ok(())
    }

    /// Looks up the current record for an object of a project.
    ///
    /// A miss is `Ok(None)`, not an error.
    fn lookup(&self, project: &Path, object: &ObjectId) -> Result<Option<ExportRecord>>;

    /// Returns the records an interchange file corresponds to.
    ///
    /// Records whose source file is `file` win. When there are none, records
    /// whose exported object's file stem equals the stem of `file` are
    /// returned, which covers tools that hand back one file per object.
    /// Results are ordered by object name, then token.
    fn resolve_from_file(&self, file: &Path) -> Result<Vec<ExportRecord>>;

    /// Lists all records, most recent first.
    fn list_records(&self) -> Result<Vec<ExportRecord>>;

    /// Returns the source file of the most recent export of `project`.
    fn latest_file_for_project(&self, project: &Path) -> Result<Option<PathBuf>>;

    // ==================== Session Operations ====================

    /// Returns the command port of the most recently used tool instance.
    fn last_session_port(&self) -> Result<Option<u16>>;

    /// Remembers (or forgets) the most recently used command port.
    fn set_last_session_port(&mut self, port: Option<u16>) -> Result<()>;

    /// Gets storage statistics.
    fn stats(&self) -> Result<StoreStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of records stored.
    pub record_count: usize,
    /// Number of distinct projects with records.
    pub project_count: usize,
    /// Number of distinct interchange files referenced.
    pub file_count: usize,
    /// Most recently used command port.
    pub last_session_port: Option<u16>,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}

/// Stem of an interchange file, without any extension.
///
/// `Body.ruvx.json` has the stem `Body`.
pub(crate) fn interchange_stem(file: &Path) -> Option<String> {
    let name = file.file_name()?.to_str()?;
    let stem = name.split('.').next().unwrap_or(name);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Distinct source files of a batch, in first-seen order.
pub(crate) fn batch_files(records: &[ExportRecord]) -> Vec<&Path> {
    let mut files: Vec<&Path> = Vec::new();
    for record in records {
        if !files.contains(&record.source_file.as_path()) {
            files.push(&record.source_file);
        }
    }
    files
}

/// Sorts records by object name, then token.
pub(crate) fn sort_for_resolution(records: &mut [ExportRecord]) {
    records.sort_by(|a, b| {
        a.object
            .name
            .cmp(&b.object.name)
            .then(a.object.token.cmp(&b.object.token))
    });
}
