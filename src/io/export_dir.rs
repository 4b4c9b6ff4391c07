//! Export directory resolution.
//!
//! Interchange files always live under a bridge-specific folder inside a
//! temporary root, never in an arbitrary user location. The first root
//! whose folder can be created wins; as a last resort a fresh temporary
//! directory is created and kept.

use crate::error::{IoError, Result};
use std::path::{Path, PathBuf};

/// Name of the bridge folder under the temporary root.
pub const EXPORT_SUBDIR_NAME: &str = "rizomuv_bridge";

/// Candidate folders in priority order, without touching the filesystem.
///
/// `override_root` plays the role of a host-specific temp directory; the
/// OS temp directory follows. Relative roots are resolved against the
/// current directory, so every candidate is absolute.
#[must_use]
pub fn candidate_directories(override_root: Option<&Path>) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    if let Some(root) = override_root {
        roots.push(std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()));
    }
    let system = std::env::temp_dir();
    if !roots.contains(&system) {
        roots.push(system);
    }
    roots
        .into_iter()
        .map(|root| root.join(EXPORT_SUBDIR_NAME))
        .collect()
}

/// Returns the export directory, creating it on demand.
///
/// # Errors
///
/// Returns an error only if no candidate can be created and the fallback
/// temporary directory cannot be created either.
pub fn export_directory(override_root: Option<&Path>) -> Result<PathBuf> {
    for dir in candidate_directories(override_root) {
        match std::fs::create_dir_all(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "export directory candidate rejected");
            }
        }
    }

    let fallback = tempfile::Builder::new()
        .prefix(&format!("{EXPORT_SUBDIR_NAME}_"))
        .tempdir()
        .map_err(|e| IoError::DirectoryFailed {
            path: std::env::temp_dir().to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    let dir = fallback.keep();
    tracing::warn!(dir = %dir.display(), "using fallback export directory");
    Ok(dir)
}
