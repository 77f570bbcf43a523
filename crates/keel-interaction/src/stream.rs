//! Decoding of the `claude --output-format stream-json` line protocol.
//!
//! Every stdout line is one JSON object with a `type` field:
//!
//! ```text
//! {"type":"system","subtype":"init","session_id":"…","cwd":"…"}
//! {"type":"assistant","message":{"content":[{"type":"text","text":"…"},{"type":"tool_use","name":"Bash","input":{…}}]}}
//! {"type":"user","message":{…}}                      # tool results, ignored
//! {"type":"result","subtype":"success","is_error":false,"duration_ms":812,"num_turns":1,"session_id":"…","total_cost_usd":0.0123}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use keel_core::error::{KeelError, Result};
use keel_core::query::QueryEvent;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamLine {
    System {
        #[serde(default)]
        subtype: String,
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    Assistant {
        message: AssistantBody,
    },
    Result {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        total_cost_usd: Option<f64>,
        #[serde(default)]
        duration_ms: u64,
        #[serde(default)]
        num_turns: u32,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AssistantBody {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// Decodes one stdout line into zero or more events.
///
/// Blank lines and message kinds without a counterpart (tool results,
/// thinking blocks) yield no events. An assistant message yields one event
/// per text or tool-use block, in order.
///
/// # Errors
///
/// Returns `KeelError::Serialization` if the line is not a JSON object with
/// a recognised shape.
pub fn parse_line(line: &str) -> Result<Vec<QueryEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: StreamLine = serde_json::from_str(line).map_err(|e| KeelError::Serialization {
        format: "stream-json".to_string(),
        message: e.to_string(),
    })?;

    let events = match parsed {
        StreamLine::System { subtype, data } => vec![QueryEvent::SystemEvent {
            subtype,
            data: Value::Object(data),
        }],
        StreamLine::Assistant { message } => message
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(QueryEvent::AssistantText(text)),
                ContentBlock::ToolUse { name, input } => {
                    Some(QueryEvent::ToolInvocation { name, input })
                }
                ContentBlock::Other => None,
            })
            .collect(),
        StreamLine::Result {
            session_id,
            total_cost_usd,
            duration_ms,
            num_turns,
            is_error,
        } => vec![QueryEvent::ResultSummary {
            session_id,
            total_cost_usd,
            duration_ms,
            num_turns,
            is_error,
        }],
        StreamLine::Other => Vec::new(),
    };

    Ok(events)
}
