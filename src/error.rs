//! Error types for rizom-bridge operations.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! round trip: configuration, preconditions, storage, file I/O,
//! interchange decoding, negotiation with the external tool, and CLI
//! commands. [`Error::kind`] maps every variant onto the coarse taxonomy
//! reported to users.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for bridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (metadata store).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Interchange file could not be written or decoded.
    #[error("interchange error: {0}")]
    Interchange(#[from] InterchangeError),

    /// The external tool could not be reached nor launched.
    #[error("configuration error: {0}")]
    Negotiation(#[from] NegotiationError),

    /// An operation precondition was not met. Nothing was changed.
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A file or object could not be attributed to a known export.
    #[error("cannot attribute {subject} to a known export")]
    Resolution {
        /// File path or object that failed to resolve.
        subject: String,
    },

    /// Some, but not all, objects of an import were processed.
    #[error("partial import of {file}: {updated} object(s) updated, {failed} failed")]
    PartialFailure {
        /// Interchange file that was imported.
        file: String,
        /// Number of objects updated.
        updated: usize,
        /// Number of objects that failed.
        failed: usize,
    },
}

/// Coarse error classification shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad executable path or configuration value.
    Configuration,
    /// Project unsaved, nothing selected.
    Precondition,
    /// File read/write failure, including malformed interchange files.
    Io,
    /// Import file not attributable to a known export.
    Resolution,
    /// Some but not all channels/objects processed.
    PartialFailure,
    /// Metadata store failure.
    Storage,
    /// Invalid CLI usage.
    Command,
}

impl Error {
    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. }
            | Self::Negotiation(_)
            | Self::Command(CommandError::HandoffFailed { .. }) => ErrorKind::Configuration,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Io(_) | Self::Interchange(_) => ErrorKind::Io,
            Self::Resolution { .. } => ErrorKind::Resolution,
            Self::PartialFailure { .. } => ErrorKind::PartialFailure,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Command(_) => ErrorKind::Command,
        }
    }
}

/// Preconditions checked before an operation has any side effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// The host project has no on-disk location yet.
    #[error("project not saved: save the project before using the RizomUV bridge")]
    ProjectNotSaved,

    /// No mesh object in the current selection.
    #[error("nothing to export: select at least one mesh object")]
    NothingToExport,
}

/// Storage-specific errors for metadata store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// Interchange decoding errors.
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// The file is not a valid interchange document.
    #[error("malformed interchange file {path}: {reason}")]
    Malformed {
        /// Path to the file.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Document written by an incompatible bridge version.
    #[error("unsupported interchange version {found} in {path} (expected {expected})")]
    UnsupportedVersion {
        /// Path to the file.
        path: String,
        /// Version found in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// A requested object has no mesh data in the host.
    #[error("object has no mesh data: {name}")]
    NotAMesh {
        /// Object name.
        name: String,
    },
}

/// Failures of the reach-or-launch handoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// Configured executable does not exist.
    #[error("RizomUV executable not found: {path}")]
    ExecutableMissing {
        /// Configured executable path.
        path: String,
    },

    /// The executable exists but could not be started.
    #[error("failed to launch RizomUV at {path}: {reason}")]
    SpawnFailed {
        /// Configured executable path.
        path: String,
        /// OS error message.
        reason: String,
    },
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Export file was written but could not be handed to RizomUV.
    #[error("exported to {file}, but {reason}")]
    HandoffFailed {
        /// Export file left on disk for manual recovery.
        file: String,
        /// Negotiation failure.
        reason: String,
    },
}

// Implement From traits for standard library errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
