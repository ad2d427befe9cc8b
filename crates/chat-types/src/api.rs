//! Wire payloads of the remote chat API and their normalization into
//! transcript messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::error_text;
use crate::message::{new_message_id, now_timestamp, Message, Role};

/// Body of `POST /chat` and `POST /chat/stream`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
}

/// One entry of the `GET /chat` history array. Every field except `role`
/// and `content` is optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub streaming: Option<bool>,
    #[serde(default)]
    pub references: Option<Vec<String>>,
}

impl HistoryEntry {
    pub fn into_message(self) -> Message {
        let id = match self.id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => new_message_id(),
        };
        Message {
            id,
            role: Role::from_wire(self.role.as_deref().unwrap_or("assistant")),
            content: content_text(&self.content),
            timestamp: self.timestamp.unwrap_or_else(now_timestamp),
            streaming: self.streaming.unwrap_or(false),
            references: self.references,
        }
    }
}

/// Normalize a fetched history into transcript order (oldest first, as sent).
pub fn normalize_history(entries: Vec<HistoryEntry>) -> Vec<Message> {
    entries.into_iter().map(HistoryEntry::into_message).collect()
}

/// Reply of the non-streaming `POST /chat`. Older servers answer
/// `{response}`, newer ones `{success, content, timestamp, references}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub references: Option<Vec<String>>,
}

impl SendResponse {
    /// A `success: false` reply becomes a system error message instead of a
    /// failure, so the transcript shows what the server said.
    pub fn into_message(self) -> Message {
        if self.success == Some(false) {
            let detail = match (&self.error, &self.content) {
                (Some(error), _) if !error.is_null() => error_text(error),
                (_, Value::Null) => "Request failed".to_string(),
                (_, content) => content_text(content),
            };
            return Message::error(detail);
        }

        let content = match self.response {
            Some(text) if !text.is_empty() => text,
            _ => content_text(&self.content),
        };
        let mut message = Message::assistant(content);
        if let Some(timestamp) = self.timestamp {
            message.timestamp = timestamp;
        }
        message.references = self.references.filter(|refs| !refs.is_empty());
        message
    }
}

/// Text of a content field. Structured content is shown as pretty JSON.
pub fn content_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
