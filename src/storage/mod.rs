//! Metadata store for rizom-bridge.
//!
//! Persists export records (object identity → exported file, original
//! selection and mode) across the export → external edit → import window.
//! `SQLite` is the default backend; an in-memory backend covers hosts that
//! keep records for one session only.

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryRecordStore;
pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteRecordStore;
pub use traits::{RecordStore, StoreStats};

/// Default database file name, placed in the export directory.
pub const DEFAULT_DB_NAME: &str = "bridge-state.db";
