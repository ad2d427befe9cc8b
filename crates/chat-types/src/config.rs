use serde::{Deserialize, Serialize};

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the chat API. Empty means same origin.
    pub api_base: String,
    pub default_mode: ChatMode,
    pub token_refresh_interval_ms: u32,
    /// Minimum remaining token lifetime before the identity provider refreshes it
    pub token_min_validity_secs: u32,
    pub abrupt_close: AbruptClosePolicy,
    /// How long a notification toast stays on screen
    pub notice_duration_secs: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            default_mode: ChatMode::Streaming,
            token_refresh_interval_ms: 30_000,
            token_min_validity_secs: 30,
            abrupt_close: AbruptClosePolicy::Complete,
            notice_duration_secs: 4.0,
        }
    }
}

impl ChatConfig {
    /// Defaults, with the API base taken from `CHAT_API_BASE_URL` at build time.
    pub fn from_env() -> Self {
        Self::default().with_api_base(option_env!("CHAT_API_BASE_URL").unwrap_or(""))
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Absolute URL for an API path such as `/chat/stream`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

/// How a reply is requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Streaming,
    Regular,
}

impl ChatMode {
    pub fn all() -> &'static [ChatMode] {
        &[ChatMode::Streaming, ChatMode::Regular]
    }

    pub fn label(&self) -> &str {
        match self {
            ChatMode::Streaming => "Streaming",
            ChatMode::Regular => "Regular",
        }
    }
}

/// What to do when a stream body ends without a `done` or `error` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbruptClosePolicy {
    /// Treat the close as a successful completion
    Complete,
    /// Report the close as a stream error
    Fail,
}
