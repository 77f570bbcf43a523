//! Project DTOs and domain conversions

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use keel_core::project::Project;
use keel_core::session::{ChatMessage, MessageRole, SessionRecord};

/// The whole project document: project name to raw project entry.
///
/// Entries are kept as raw JSON until conversion so that one bad entry does
/// not make the rest of the document unreadable.
pub type ProjectDocument = BTreeMap<String, serde_json::Value>;

/// One `{role, content}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub role: String,
    pub content: String,
}

/// A saved session as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDto {
    #[serde(default = "keel_core::time::now")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    /// Always written, `null` when absent
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cost: f64,
}

/// A project as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDto {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub is_temp: bool,
    #[serde(default = "keel_core::time::now")]
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<NaiveDateTime>,
    #[serde(default)]
    pub sessions: Vec<SessionDto>,
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<&ChatMessage> for MessageDto {
    fn from(message: &ChatMessage) -> Self {
        MessageDto {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

impl TryFrom<MessageDto> for ChatMessage {
    type Error = String;

    fn try_from(dto: MessageDto) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            role: dto.role.parse::<MessageRole>()?,
            content: dto.content,
        })
    }
}

impl From<&SessionRecord> for SessionDto {
    fn from(record: &SessionRecord) -> Self {
        SessionDto {
            timestamp: record.timestamp,
            messages: record.messages.iter().map(MessageDto::from).collect(),
            session_id: record.session_id.clone(),
            cost: record.cost,
        }
    }
}

impl TryFrom<SessionDto> for SessionRecord {
    type Error = String;

    fn try_from(dto: SessionDto) -> Result<Self, Self::Error> {
        let messages = dto
            .messages
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let record = SessionRecord {
            timestamp: dto.timestamp,
            messages,
            session_id: dto.session_id,
            cost: dto.cost,
        };
        record.validate().map_err(|e| e.to_string())?;
        Ok(record)
    }
}

impl From<&Project> for ProjectDto {
    fn from(project: &Project) -> Self {
        ProjectDto {
            name: project.name.clone(),
            path: project.path.clone(),
            is_temp: project.is_temp,
            created_at: project.created_at,
            last_accessed: project.last_accessed,
            sessions: project.sessions.iter().map(SessionDto::from).collect(),
        }
    }
}

impl TryFrom<ProjectDto> for Project {
    type Error = String;

    fn try_from(dto: ProjectDto) -> Result<Self, Self::Error> {
        let sessions = dto
            .sessions
            .into_iter()
            .enumerate()
            .map(|(i, s)| SessionRecord::try_from(s).map_err(|e| format!("session {}: {}", i, e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Project {
            name: dto.name,
            path: dto.path,
            is_temp: dto.is_temp,
            created_at: dto.created_at,
            last_accessed: dto.last_accessed,
            sessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_minimal_legacy_entry() {
        let dto: ProjectDto = serde_json::from_value(json!({
            "name": "site",
            "path": "/work/site",
            "created_at": "2024-05-01T10:20:30.123456",
            "sessions": [
                {
                    "timestamp": "2024-05-01T10:25:00",
                    "messages": [{"role": "user", "content": "hi"}],
                    "session_id": null,
                    "cost": 0
                }
            ]
        }))
        .unwrap();

        let project = Project::try_from(dto).unwrap();
        assert!(!project.is_temp);
        assert_eq!(project.last_accessed, None);
        assert_eq!(project.sessions.len(), 1);
        assert_eq!(project.sessions[0].cost, 0.0);
        assert_eq!(project.sessions[0].messages[0], ChatMessage::user("hi"));
    }

    #[test]
    fn test_written_fields_match_wire_contract() {
        let mut project = Project::new("site", "/work/site", false);
        project.sessions.push(SessionRecord::new(
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            None,
            0.001,
        ));

        let value = serde_json::to_value(ProjectDto::from(&project)).unwrap();
        let object = value.as_object().unwrap();
        for key in ["name", "path", "is_temp", "created_at", "sessions"] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert!(!object.contains_key("last_accessed"));

        let session = &value["sessions"][0];
        assert_eq!(session["session_id"], serde_json::Value::Null);
        assert_eq!(session["cost"], json!(0.001));
        assert_eq!(session["messages"][1]["role"], json!("assistant"));
        assert!(session["timestamp"].is_string());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let dto = SessionDto {
            timestamp: keel_core::time::now(),
            messages: vec![MessageDto {
                role: "narrator".to_string(),
                content: "once upon a time".to_string(),
            }],
            session_id: None,
            cost: 0.0,
        };
        assert!(SessionRecord::try_from(dto).is_err());
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let dto: ProjectDto = serde_json::from_value(json!({
            "name": "site",
            "path": "/work/site",
            "sessions": [
                {
                    "timestamp": "2024-05-01T10:25:00",
                    "messages": [{"role": "user", "content": "hi"}],
                    "cost": -5.0
                }
            ]
        }))
        .unwrap();

        let err = Project::try_from(dto).unwrap_err();
        assert!(err.contains("non-negative"), "{}", err);
    }
}
