//! # rizom-bridge
//!
//! Round-trip bridge between a 3D host application and RizomUV.
//!
//! The bridge exports the selected meshes of a host scene, hands the file
//! to a running RizomUV instance or launches one, and later imports every
//! UV channel back onto the original objects without touching geometry,
//! modifiers or materials. The host's selection and interaction mode are
//! restored after each step.
//!
//! ## Features
//!
//! - **Reach or launch**: loopback probing of running instances, most
//!   recently used port first, with a launch fallback
//! - **`SQLite` Metadata**: export records survive host restarts
//! - **Pluggable Hosts and Codecs**: [`host::Host`] and
//!   [`interchange::Interchange`] traits
//! - **Safe Imports**: per-object warnings and failures instead of aborts
//!
//! ## Example
//!
//! ```no_run
//! use rizom_bridge::{Bridge, BridgeConfig, SceneFile, SqliteRecordStore};
//! use rizom_bridge::storage::RecordStore;
//!
//! # fn main() -> rizom_bridge::Result<()> {
//! let config = BridgeConfig::load(None)?;
//! let mut store = SqliteRecordStore::open(config.state_db_path()?)?;
//! store.init()?;
//!
//! let mut scene = SceneFile::open("robot.scene.json")?;
//! let mut bridge = Bridge::new(config, store);
//! let batch = bridge.export_selection(&mut scene)?;
//!
//! // ... UVs are edited in RizomUV ...
//!
//! let report = bridge.import_from(&mut scene, &batch.file)?;
//! scene.save()?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod bridge;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod interchange;
pub mod io;
pub mod negotiator;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, ErrorKind, Result};

// Re-export core domain types
pub use core::{
    ExportRecord, InteractionMode, Mesh, ObjectId, ObjectInfo, ObjectKind, SelectionSnapshot,
    UvChannel,
};

// Re-export orchestration types
pub use bridge::{Bridge, ExportBatch, ImportReport, ImportWarning, SelectionGuard};
pub use config::BridgeConfig;
pub use negotiator::{HandoffOutcome, Negotiator, ProbeOutcome};

// Re-export storage types
pub use storage::{DEFAULT_DB_NAME, MemoryRecordStore, RecordStore, SqliteRecordStore};

// Re-export host and codec types
pub use host::{Host, SceneDocument, SceneFile};
pub use interchange::{Interchange, JsonInterchange};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
