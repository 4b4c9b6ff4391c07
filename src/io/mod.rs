//! I/O utilities for rizom-bridge.
//!
//! File reading/writing with bridge error reporting, and resolution of the
//! export directory interchange files are written to.

pub mod export_dir;
pub mod files;

pub use export_dir::{EXPORT_SUBDIR_NAME, candidate_directories, export_directory};
pub use files::{read_file, write_file};
