//! The in-progress conversation of the interactive session.

use keel_core::query::QueryEvent;
use keel_core::session::{ChatMessage, SessionRecord};

/// Collects the transcript of the current conversation until it is saved.
///
/// A turn starts with [`push_user`](Self::push_user), receives the query's
/// events through [`observe`](Self::observe) and ends with
/// [`finish_turn`](Self::finish_turn), which commits the assistant reply.
#[derive(Debug, Default)]
pub struct ConversationRecorder {
    messages: Vec<ChatMessage>,
    /// Assistant reply of the turn in progress
    pending_reply: Option<String>,
    /// Tools invoked during the turn in progress
    turn_tools: Vec<String>,
    session_id: Option<String>,
    cost: f64,
    /// Message count at the last save
    saved_len: Option<usize>,
}

impl ConversationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a turn with the user's prompt.
    pub fn push_user(&mut self, prompt: impl Into<String>) {
        self.messages.push(ChatMessage::user(prompt));
        self.pending_reply = Some(String::new());
        self.turn_tools.clear();
    }

    /// Folds one query event into the turn in progress.
    pub fn observe(&mut self, event: &QueryEvent) {
        match event {
            QueryEvent::AssistantText(text) => {
                self.pending_reply
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
            QueryEvent::ToolInvocation { name, .. } => {
                self.turn_tools.push(name.clone());
            }
            QueryEvent::SystemEvent { subtype, .. } => {
                tracing::trace!("System event: {}", subtype);
            }
            QueryEvent::ResultSummary {
                session_id,
                total_cost_usd,
                ..
            } => {
                if let Some(id) = session_id {
                    self.session_id = Some(id.clone());
                }
                if let Some(cost) = total_cost_usd.filter(|c| c.is_finite() && *c > 0.0) {
                    self.cost += cost;
                }
            }
        }
    }

    /// Commits the assistant reply of the turn in progress.
    ///
    /// The reply is recorded even when the query produced no text. Returns
    /// the committed message, or `None` if no turn was open.
    pub fn finish_turn(&mut self) -> Option<&ChatMessage> {
        let reply = self.pending_reply.take()?;
        self.messages.push(ChatMessage::assistant(reply));
        self.messages.last()
    }

    /// Drops the assistant reply of a failed turn, keeping the user prompt.
    pub fn abort_turn(&mut self) {
        self.pending_reply = None;
    }

    /// Tools invoked during the most recent turn.
    pub fn turn_tools(&self) -> &[String] {
        &self.turn_tools
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Cost accumulated over all turns, in USD.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Whether messages were added since the last save.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.is_empty() && self.saved_len != Some(self.messages.len())
    }

    /// Records that the current transcript has been saved.
    pub fn mark_saved(&mut self) {
        self.saved_len = Some(self.messages.len());
    }

    /// Snapshot of the transcript as a new session record.
    pub fn to_session_record(&self) -> SessionRecord {
        SessionRecord::new(self.messages.clone(), self.session_id.clone(), self.cost)
    }

    /// Replaces the transcript with a stored one.
    ///
    /// The collaborator session id and accumulated cost are kept.
    pub fn load_from(&mut self, record: &SessionRecord) {
        self.messages = record.messages.clone();
        self.pending_reply = None;
        self.turn_tools.clear();
        self.saved_len = Some(self.messages.len());
    }

    /// Forgets everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
