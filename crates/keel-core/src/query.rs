//! Query collaborator model.
//!
//! The AI query service is an external collaborator: given a prompt and a
//! [`QueryOptions`] bundle it streams back zero or more assistant events
//! followed by exactly one [`QueryEvent::ResultSummary`]. Adapters turn
//! whatever their transport emits into these variants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::mpsc;

use crate::error::Result;

/// How the collaborator asks for permission before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    #[default]
    Default,
    AcceptEdits,
    BypassPermissions,
    Plan,
}

impl PermissionMode {
    pub const ALL: [PermissionMode; 4] = [
        PermissionMode::Default,
        PermissionMode::AcceptEdits,
        PermissionMode::BypassPermissions,
        PermissionMode::Plan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PermissionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = PermissionMode::ALL.iter().map(|m| m.as_str()).collect();
                format!(
                    "unknown permission mode '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                )
            })
    }
}

/// Configuration bundle submitted with every prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Working directory the collaborator operates in
    pub cwd: PathBuf,
    pub permission_mode: PermissionMode,
    /// Model override; `None` lets the collaborator pick
    pub model: Option<String>,
    /// Continue the most recent conversation in `cwd`
    pub continue_conversation: bool,
}

impl QueryOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            permission_mode: PermissionMode::Default,
            model: None,
            continue_conversation: true,
        }
    }
}

/// One event streamed back by the query collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// A fragment of assistant text
    AssistantText(String),
    /// The assistant invoked a tool
    ToolInvocation {
        name: String,
        input: serde_json::Value,
    },
    /// Transport-level notification (session init and the like)
    SystemEvent {
        subtype: String,
        data: serde_json::Value,
    },
    /// Terminal event of a query
    ResultSummary {
        session_id: Option<String>,
        total_cost_usd: Option<f64>,
        duration_ms: u64,
        num_turns: u32,
        is_error: bool,
    },
}

impl QueryEvent {
    /// Whether this event ends the query.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryEvent::ResultSummary { .. })
    }
}

/// The AI query collaborator.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submits `prompt` and returns the stream of events it produces.
    ///
    /// The receiver yields events in order and is closed after the terminal
    /// `ResultSummary` (or after an `Err` if the query failed midway).
    ///
    /// # Errors
    ///
    /// Returns `KeelError::Query` if the query could not be started.
    async fn query(
        &self,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<mpsc::Receiver<Result<QueryEvent>>>;
}
