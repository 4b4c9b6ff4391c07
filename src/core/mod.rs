//! Core domain models for rizom-bridge.
//!
//! Object identity, mesh/UV data, selection state and export records.
//! These are pure domain models with no I/O dependencies.

pub mod mesh;
pub mod object;
pub mod record;
pub mod selection;

pub use mesh::{Mesh, UvChannel};
pub use object::{ObjectId, ObjectInfo, ObjectKind, clean_name};
pub use record::ExportRecord;
pub use selection::{InteractionMode, SelectionSnapshot};
