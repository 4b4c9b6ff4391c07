//! `SQLite` record store implementation.
//!
//! Provides persistent storage for export records with transaction
//! management and migration support. Records survive host restarts.

// SQLite stores all integers as i64. Tokens are u64 and round-trip
// through the same bit pattern.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::core::record::current_timestamp;
use crate::core::{ExportRecord, InteractionMode, ObjectId};
use crate::error::{Result, StorageError};
use crate::storage::schema::{
    CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL,
};
use crate::storage::traits::{RecordStore, StoreStats, batch_files, sort_for_resolution};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

/// Session key holding the most recently used command port.
const LAST_PORT_KEY: &str = "last_port";

/// Columns selected for every record query, in `RawRecord` order.
const RECORD_COLUMNS: &str = "project, object_token, object_name, source_file, captured_at, \
                              selection, active, mode";

/// SQLite-based record store.
///
/// # Examples
///
/// ```no_run
/// use rizom_bridge::storage::{RecordStore, SqliteRecordStore};
///
/// let mut store = SqliteRecordStore::open("bridge-state.db").unwrap();
/// store.init().unwrap();
/// ```
pub struct SqliteRecordStore {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

/// Record row as stored, before JSON columns are decoded.
struct RawRecord {
    project: String,
    token: i64,
    name: String,
    source_file: String,
    captured_at: i64,
    selection: String,
    active: Option<String>,
    mode: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            project: row.get(0)?,
            token: row.get(1)?,
            name: row.get(2)?,
            source_file: row.get(3)?,
            captured_at: row.get(4)?,
            selection: row.get(5)?,
            active: row.get(6)?,
            mode: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<ExportRecord> {
        let selection: Vec<ObjectId> =
            serde_json::from_str(&self.selection).map_err(StorageError::from)?;
        let active: Option<ObjectId> = self
            .active
            .map(|a| serde_json::from_str(&a))
            .transpose()
            .map_err(StorageError::from)?;
        let mode: InteractionMode = serde_json::from_str(&self.mode).map_err(StorageError::from)?;

        Ok(ExportRecord {
            project: PathBuf::from(self.project),
            object: ObjectId::new(self.token as u64, self.name),
            source_file: PathBuf::from(self.source_file),
            captured_at: self.captured_at,
            selection,
            active,
            mode,
        })
    }
}

impl SqliteRecordStore {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database file. Missing parent directories are
    ///   created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;

        // WAL returns the resulting mode, so it goes through query_row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// Useful for testing.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get_schema_version(&self) -> Result<Option<u32>> {
        let version: Option<String> = self
            .conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        Ok(version.and_then(|v| v.parse().ok()))
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute(SET_VERSION_SQL, params![version.to_string()])
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn query_records(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<ExportRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(StorageError::from)?;
        let raw = stmt
            .query_map(args, RawRecord::from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        raw.into_iter().map(RawRecord::into_record).collect()
    }

    fn delete_file(conn: &Connection, file: &Path) -> Result<usize> {
        let removed = conn
            .execute(
                "DELETE FROM export_records WHERE source_file = ?",
                params![file.to_string_lossy()],
            )
            .map_err(StorageError::from)?;
        Ok(removed)
    }

    fn insert(conn: &Connection, record: &ExportRecord) -> Result<()> {
        let selection = serde_json::to_string(&record.selection).map_err(StorageError::from)?;
        let active = record
            .active
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;
        let mode = serde_json::to_string(&record.mode).map_err(StorageError::from)?;

        conn.execute(
            r"
            INSERT OR REPLACE INTO export_records (
                project, object_token, object_name, source_file, file_stem,
                captured_at, selection, active, mode, seq
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?,
                COALESCE((SELECT MAX(seq) FROM export_records), 0) + 1)
        ",
            params![
                record.project.to_string_lossy(),
                record.object.token as i64,
                record.object.name,
                record.source_file.to_string_lossy(),
                record.object.file_stem(),
                record.captured_at,
                selection,
                active,
                mode,
            ],
        )
        .map_err(StorageError::from)?;

        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn init(&mut self) -> Result<()> {
        let is_init: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;

        if is_init == 0 {
            // Fresh install - create schema
            self.conn
                .execute_batch(SCHEMA_SQL)
                .map_err(StorageError::from)?;
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        } else if let Some(current) = self.get_schema_version()?
            && current < CURRENT_SCHEMA_VERSION
        {
            for migration in crate::storage::schema::get_migrations_from(current) {
                self.conn
                    .execute_batch(migration.sql)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
            }
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn reset(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            DELETE FROM export_records;
            DELETE FROM session;
        ",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    // ==================== Record Operations ====================

    fn record(&mut self, record: &ExportRecord) -> Result<()> {
        Self::insert(&self.conn, record)?;
        tracing::debug!(object = %record.object, file = %record.source_file.display(), "stored export record");
        Ok(())
    }

    fn record_batch(&mut self, records: &[ExportRecord]) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        for file in batch_files(records) {
            Self::delete_file(&tx, file)?;
        }
        for record in records {
            Self::insert(&tx, record)?;
        }

        tx.commit()
            .map_err(|e| StorageError::Transaction(e.to_string()))?;
        tracing::debug!(count = records.len(), "stored export batch");
        Ok(())
    }

    fn forget_file(&mut self, file: &Path) -> Result<usize> {
        let removed = Self::delete_file(&self.conn, file)?;
        tracing::debug!(file = %file.display(), removed, "forgot records for file");
        Ok(removed)
    }

    fn lookup(&self, project: &Path, object: &ObjectId) -> Result<Option<ExportRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM export_records \
                     WHERE project = ? AND object_token = ?"
                ),
                params![project.to_string_lossy(), object.token as i64],
                RawRecord::from_row,
            )
            .optional()
            .map_err(StorageError::from)?;

        raw.map(RawRecord::into_record).transpose()
    }

    fn resolve_from_file(&self, file: &Path) -> Result<Vec<ExportRecord>> {
        let mut records = self.query_records(
            &format!("SELECT {RECORD_COLUMNS} FROM export_records WHERE source_file = ?"),
            params![file.to_string_lossy()],
        )?;

        if records.is_empty()
            && let Some(stem) = crate::storage::traits::interchange_stem(file)
        {
            records = self.query_records(
                &format!("SELECT {RECORD_COLUMNS} FROM export_records WHERE file_stem = ?"),
                params![stem],
            )?;
        }

        sort_for_resolution(&mut records);
        Ok(records)
    }

    fn list_records(&self) -> Result<Vec<ExportRecord>> {
        self.query_records(
            &format!("SELECT {RECORD_COLUMNS} FROM export_records ORDER BY seq DESC"),
            [],
        )
    }

    fn latest_file_for_project(&self, project: &Path) -> Result<Option<PathBuf>> {
        let file: Option<String> = self
            .conn
            .query_row(
                "SELECT source_file FROM export_records WHERE project = ? \
                 ORDER BY seq DESC LIMIT 1",
                params![project.to_string_lossy()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(file.map(PathBuf::from))
    }

    // ==================== Session Operations ====================

    fn last_session_port(&self) -> Result<Option<u16>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM session WHERE key = ?",
                params![LAST_PORT_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(value.and_then(|v| v.parse().ok()))
    }

    fn set_last_session_port(&mut self, port: Option<u16>) -> Result<()> {
        match port {
            Some(port) => {
                self.conn
                    .execute(
                        "INSERT OR REPLACE INTO session (key, value, updated_at) VALUES (?, ?, ?)",
                        params![LAST_PORT_KEY, port.to_string(), current_timestamp()],
                    )
                    .map_err(StorageError::from)?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM session WHERE key = ?", params![LAST_PORT_KEY])
                    .map_err(StorageError::from)?;
            }
        }
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let (record_count, project_count, file_count): (i64, i64, i64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT project), COUNT(DISTINCT source_file) \
                 FROM export_records",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(StorageError::from)?;

        let db_size = self
            .path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len());

        Ok(StoreStats {
            record_count: record_count as usize,
            project_count: project_count as usize,
            file_count: file_count as usize,
            last_session_port: self.last_session_port()?,
            schema_version: self.get_schema_version()?.unwrap_or(0),
            db_size,
        })
    }
}
