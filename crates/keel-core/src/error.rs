//! Error types for keel.

use std::path::PathBuf;
use thiserror::Error;

/// A shared error type for the keel crates.
///
/// Registry-level failures (`DuplicateName`, `NotFound`, `NotTemporary`,
/// `IndexOutOfRange`) are raised synchronously at the offending call and leave
/// the registry unchanged. Storage failures carry the document path so the
/// front-end can tell the user which file is affected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeelError {
    /// A project with this name is already registered
    #[error("Project '{0}' already exists")]
    DuplicateName(String),

    /// Entity not found error with type information
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Conversion was requested for a project that is already permanent
    #[error("Project '{0}' is not a temporary project")]
    NotTemporary(String),

    /// Session index outside `[0, len)`
    #[error("Invalid session index: {index} (project has {len} sessions)")]
    IndexOutOfRange { index: i64, len: usize },

    /// Project name rejected (empty or whitespace only)
    #[error("Invalid project name: {0}")]
    InvalidName(String),

    /// Session record rejected before append
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// The project document exists but could not be read or parsed
    #[error("Failed to read project store {}: {message}", path.display())]
    StorageReadFailure { path: PathBuf, message: String },

    /// The project document could not be written
    #[error("Failed to write project store {}: {message}", path.display())]
    StorageWriteFailure { path: PathBuf, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The AI query collaborator failed
    #[error("Query error: {0}")]
    Query(String),
}

impl KeelError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a NotFound error for a project name
    pub fn project_not_found(name: impl Into<String>) -> Self {
        Self::not_found("Project", name)
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Creates a StorageReadFailure error
    pub fn storage_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StorageReadFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a StorageWriteFailure error
    pub fn storage_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StorageWriteFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a storage read or write failure
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageReadFailure { .. } | Self::StorageWriteFailure { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for KeelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// A type alias for `Result<T, KeelError>`.
pub type Result<T> = std::result::Result<T, KeelError>;
