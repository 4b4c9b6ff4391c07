//! File reading and writing utilities.

use crate::error::{IoError, Result};
use std::path::Path;

/// Maximum interchange file size to read into memory (1GB).
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Reads a file to string.
///
/// # Errors
///
/// Returns an error if the file is missing, too large, unreadable, or not
/// valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use rizom_bridge::io::read_file;
///
/// let content = read_file("/tmp/rizomuv_bridge/Body.ruvx.json").unwrap();
/// ```
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if !path_ref.is_file() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let size = std::fs::metadata(path_ref)
        .map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
        .len();

    if size > MAX_FILE_SIZE {
        return Err(IoError::ReadFailed {
            path: path_str,
            reason: format!("file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"),
        }
        .into());
    }

    std::fs::read_to_string(path_ref).map_err(|e| {
        IoError::ReadFailed {
            path: path_str,
            reason: e.to_string(),
        }
        .into()
    })
}

/// Writes content to a file, creating parent directories if needed.
///
/// A failed write removes whatever part of the file was created.
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::DirectoryFailed {
            path: parent.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }

    if let Err(e) = std::fs::write(path_ref, content) {
        let _ = std::fs::remove_file(path_ref);
        return Err(IoError::WriteFailed {
            path: path_str,
            reason: e.to_string(),
        }
        .into());
    }

    Ok(())
}
