//! Project repository trait.
//!
//! Defines the interface for persisting the project collection as a single
//! document.

use std::collections::BTreeMap;

use super::model::Project;
use crate::error::{KeelError, Result};

/// Result of loading the project document.
///
/// Loading never fails outright: an unreadable or malformed document yields
/// an empty collection and the read failure is reported in `warning`.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Permanent projects keyed by name
    pub projects: BTreeMap<String, Project>,
    /// Non-fatal problem encountered while loading
    pub warning: Option<KeelError>,
    /// Entries that were skipped (temporary or unparseable)
    pub skipped: Vec<String>,
}

impl LoadOutcome {
    /// An empty outcome with no warning.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Repository for the project collection.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Never persist projects with `is_temp = true`
/// - Replace the stored document as a whole on `save`, without leaving a
///   truncated document behind if the process dies mid-write
/// - Assume a single writer; no locking is expected
pub trait ProjectRepository: Send + Sync {
    /// Loads every permanent project.
    fn load(&self) -> LoadOutcome;

    /// Replaces the stored document with the given projects.
    ///
    /// Temporary projects in `projects` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `KeelError::StorageWriteFailure` if the document could not be
    /// written.
    fn save(&self, projects: &[&Project]) -> Result<()>;

    /// Human-readable location of the document, for diagnostics.
    fn location(&self) -> String;
}
