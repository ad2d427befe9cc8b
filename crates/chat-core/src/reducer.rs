//! Session reducer — the only place the transcript is mutated.
//!
//! Every change to the conversation goes through an `Action`, so the
//! renderer always observes a consistent snapshot. Applying an action never
//! suspends and never performs I/O.

use chat_types::{
    config::ChatMode,
    message::{new_message_id, now_timestamp, Message},
};

/// State of one chat view
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Oldest first; insertion order is display order
    pub transcript: Vec<Message>,
    /// Draft in the input field
    pub pending_input: String,
    /// A send or stream is in flight
    pub is_loading: bool,
    pub mode: ChatMode,
}

impl SessionState {
    pub fn new(mode: ChatMode) -> Self {
        Self {
            transcript: Vec::new(),
            pending_input: String::new(),
            is_loading: false,
            mode,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Message> {
        self.transcript.iter().find(|m| m.id == id)
    }

    /// The message currently being streamed, if any
    pub fn streaming_message(&self) -> Option<&Message> {
        self.transcript.iter().find(|m| m.streaming)
    }

    /// Whether a new message may be submitted right now
    pub fn can_submit(&self) -> bool {
        !self.is_loading && !self.pending_input.trim().is_empty()
    }

    /// Apply one action in place.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SetDraft(text) => {
                self.pending_input = text;
            }
            Action::SubmitUserMessage(message) => {
                if self.is_loading {
                    log::debug!("Ignoring submit while a request is in flight");
                    return;
                }
                self.transcript.push(message);
                self.pending_input.clear();
                self.is_loading = true;
            }
            Action::BeginAssistantStream { id, timestamp } => {
                self.transcript
                    .push(Message::streaming_placeholder(id, timestamp));
            }
            Action::ApplyContentDelta { id, content } => {
                if let Some(msg) = self.find_mut(&id) {
                    msg.content = content;
                }
            }
            Action::CompleteStream { id } => {
                if let Some(msg) = self.find_mut(&id) {
                    msg.streaming = false;
                }
                self.is_loading = false;
            }
            Action::FailStream { id, error } => {
                if let Some(id) = id {
                    self.transcript.retain(|m| m.id != id);
                }
                self.transcript.push(Message::error(error));
                self.is_loading = false;
            }
            Action::AppendAssistantMessage(message) => {
                self.transcript.push(message);
                self.is_loading = false;
            }
            Action::SetHistory(messages) => {
                self.transcript = messages;
            }
            Action::Clear => {
                self.transcript.clear();
            }
            Action::SetMode(mode) => {
                if self.is_loading {
                    log::debug!("Ignoring mode change while a request is in flight");
                    return;
                }
                self.mode = mode;
            }
            Action::SetLoading(loading) => {
                self.is_loading = loading;
            }
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.transcript.iter_mut().find(|m| m.id == id)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ChatMode::Streaming)
    }
}

/// A state transition requested by the user or by a network exchange
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the draft
    SetDraft(String),
    /// Append a user message, clear the draft, start loading
    SubmitUserMessage(Message),
    /// Append an empty assistant message that will receive deltas
    BeginAssistantStream { id: String, timestamp: String },
    /// Replace the content of `id` with the full text accumulated so far
    ApplyContentDelta { id: String, content: String },
    CompleteStream { id: String },
    /// Drop the failed stream message (if any) and report `error`
    FailStream { id: Option<String>, error: String },
    /// A complete reply from the non-streaming path
    AppendAssistantMessage(Message),
    SetHistory(Vec<Message>),
    Clear,
    SetMode(ChatMode),
    /// Settle the loading flag when a request fails before producing a message
    SetLoading(bool),
}

impl Action {
    pub fn submit_user_message(text: impl Into<String>) -> Self {
        Action::SubmitUserMessage(Message::user(text))
    }

    /// Start a stream for a freshly generated message id
    pub fn begin_assistant_stream() -> (String, Self) {
        let id = new_message_id();
        let action = Action::BeginAssistantStream {
            id: id.clone(),
            timestamp: now_timestamp(),
        };
        (id, action)
    }
}

/// Pure form of `SessionState::apply`
pub fn reduce(mut state: SessionState, action: Action) -> SessionState {
    state.apply(action);
    state
}
