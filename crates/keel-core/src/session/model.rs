//! Session record model.

use chrono::NaiveDateTime;

use super::message::ChatMessage;
use crate::error::{KeelError, Result};

/// A saved conversation transcript with its metadata.
///
/// Records are immutable once appended to a project: loading an old session
/// and saving again produces a new record, never an update.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// When the record was created
    pub timestamp: NaiveDateTime,
    /// Ordered user/assistant messages
    pub messages: Vec<ChatMessage>,
    /// Correlation token from the query collaborator, if one was reported
    pub session_id: Option<String>,
    /// Accumulated cost in USD
    pub cost: f64,
}

impl SessionRecord {
    /// Creates a record stamped with the current time.
    pub fn new(messages: Vec<ChatMessage>, session_id: Option<String>, cost: f64) -> Self {
        Self {
            timestamp: crate::time::now(),
            messages,
            session_id,
            cost,
        }
    }

    /// Number of messages in the transcript.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Checks the invariants a record must satisfy before it is appended.
    ///
    /// The cost must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(KeelError::InvalidSession(format!(
                "cost must be a non-negative number, got {}",
                self.cost
            )));
        }
        Ok(())
    }
}
