//! Database schema definitions.
//!
//! Contains SQL schema and migration logic for the bridge `SQLite`
//! database.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// SQL schema for initial database setup.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per exported object; re-exports replace the row
CREATE TABLE IF NOT EXISTS export_records (
    project TEXT NOT NULL,
    object_token INTEGER NOT NULL,
    object_name TEXT NOT NULL,
    source_file TEXT NOT NULL,
    file_stem TEXT NOT NULL,
    captured_at INTEGER NOT NULL,
    selection TEXT NOT NULL,  -- JSON array of ObjectId
    active TEXT,              -- JSON ObjectId
    mode TEXT NOT NULL,
    seq INTEGER NOT NULL,     -- insertion order, ties within one second
    PRIMARY KEY (project, object_token)
);

-- Index for import-time resolution by file
CREATE INDEX IF NOT EXISTS idx_records_file ON export_records(source_file);

-- Index for per-object file fallback
CREATE INDEX IF NOT EXISTS idx_records_stem ON export_records(file_stem);

-- Session key-value state (last command port)
CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
";

/// SQL to check if schema is initialized.
pub const CHECK_SCHEMA_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='schema_info';
";

/// SQL to get schema version.
pub const GET_VERSION_SQL: &str = r"
SELECT value FROM schema_info WHERE key = 'version';
";

/// SQL to set schema version.
pub const SET_VERSION_SQL: &str = r"
INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);
";

/// Migrations from older schema versions.
pub struct Migration {
    /// Version this migration upgrades from.
    pub from_version: u32,
    /// Version this migration upgrades to.
    pub to_version: u32,
    /// SQL statements to execute.
    pub sql: &'static str,
}

/// Available migrations, oldest first.
pub const MIGRATIONS: &[Migration] = &[];

/// Gets migrations needed to upgrade from a version.
#[must_use]
pub fn get_migrations_from(current_version: u32) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.from_version >= current_version && m.to_version <= CURRENT_SCHEMA_VERSION)
        .collect()
}
