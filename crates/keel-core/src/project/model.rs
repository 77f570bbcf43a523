use chrono::NaiveDateTime;
use std::path::PathBuf;

use crate::error::{KeelError, Result};
use crate::session::SessionRecord;

/// A named project: a working directory plus the conversations held in it.
///
/// Temporary projects live only as long as the registry that owns them;
/// permanent ones are written to the project document. A project can move
/// from temporary to permanent but never back.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Unique, case-sensitive key within the registry
    pub name: String,
    /// Default working directory for the query collaborator
    pub path: PathBuf,
    /// Whether the project is excluded from durable storage
    pub is_temp: bool,
    /// Set once at creation
    pub created_at: NaiveDateTime,
    /// Last time the project was selected, if ever
    pub last_accessed: Option<NaiveDateTime>,
    /// Saved sessions in insertion order
    pub sessions: Vec<SessionRecord>,
}

impl Project {
    /// Creates a project with no sessions, stamped with the current time.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, is_temp: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_temp,
            created_at: crate::time::now(),
            last_accessed: None,
            sessions: Vec::new(),
        }
    }

    /// Rejects empty and whitespace-only names.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(KeelError::InvalidName(
                "project name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of saved sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Sum of the cost of all saved sessions.
    pub fn total_cost(&self) -> f64 {
        self.sessions.iter().map(|s| s.cost).sum()
    }

    /// Most recent activity: last selection, falling back to creation time.
    pub fn recency(&self) -> NaiveDateTime {
        self.last_accessed.unwrap_or(self.created_at)
    }
}
