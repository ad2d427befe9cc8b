use serde::{Deserialize, Serialize};

/// Role of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Parse a wire role. Unknown roles are treated as assistant output.
    pub fn from_wire(role: &str) -> Self {
        match role {
            "user" => Role::User,
            "system" => Role::System,
            _ => Role::Assistant,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

/// Prefix carried by system messages that report a failure
pub const ERROR_PREFIX: &str = "Error: ";

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// RFC 3339 creation time, set once
    pub timestamp: String,
    #[serde(default)]
    pub streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub references: Option<Vec<String>>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            timestamp: now_timestamp(),
            streaming: false,
            references: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::with_role(Role::System, text)
    }

    /// A system message reporting `detail` as an error
    pub fn error(detail: impl AsRef<str>) -> Self {
        Self::system(format!("{}{}", ERROR_PREFIX, detail.as_ref()))
    }

    /// Empty assistant message that will be filled by a stream
    pub fn streaming_placeholder(id: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: timestamp.into(),
            streaming: true,
            references: None,
        }
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = Some(references);
        self
    }

    pub fn is_error(&self) -> bool {
        self.role == Role::System && self.content.starts_with(ERROR_PREFIX.trim_end())
    }
}

/// Fresh opaque message id. Random, so two messages created in the same
/// millisecond never collide.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
