use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of a `/chat/stream` response body, as sent by the server
/// after the `data: ` prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamRecord {
    Content {
        #[serde(default)]
        content: Option<String>,
    },
    Done,
    Error {
        #[serde(default)]
        error: Value,
    },
}

impl StreamRecord {
    /// Convert to the event consumed by the session. Content records without
    /// text carry nothing to apply and yield `None`.
    pub fn into_event(self) -> Option<StreamEvent> {
        match self {
            StreamRecord::Content { content } => match content {
                Some(text) if !text.is_empty() => Some(StreamEvent::Content(text)),
                _ => None,
            },
            StreamRecord::Done => Some(StreamEvent::Done),
            StreamRecord::Error { error } => Some(StreamEvent::Error(error_text(&error))),
        }
    }
}

/// Render an error payload that may be a plain string or a structured object.
pub fn error_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Null => "Unknown error".to_string(),
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => error.to_string(),
        },
        other => other.to_string(),
    }
}

/// Decoded event from a streaming response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An increment of assistant text
    Content(String),
    /// The stream finished successfully; nothing follows
    Done,
    /// The stream failed; nothing follows
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }
}

/// Severity of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient, user-visible notification (toast)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, description)
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, description)
    }
}
