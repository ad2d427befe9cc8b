//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `chat-core` (pure Rust).
//! Implementations live in `chat-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;
use chat_types::{Result, message::Message};

/// Raw body chunks of a streaming response, in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>>>>;

// ─── Chat API Port ───────────────────────────────────────────

/// The remote chat API. Every call needs a bearer credential; adapters
/// return `ChatError::Unauthenticated` without touching the network when
/// none is available.
#[async_trait(?Send)]
pub trait ChatApiPort {
    /// `GET /chat`, normalized into transcript messages
    async fn fetch_history(&self) -> Result<Vec<Message>>;

    /// `POST /chat/clear`
    async fn clear_history(&self) -> Result<()>;

    /// `POST /chat` — one complete assistant (or system error) message
    async fn send_message(&self, text: &str) -> Result<Message>;

    /// `POST /chat/stream` — resolves once response headers arrive with a
    /// success status; the body is then read chunk by chunk.
    async fn stream_message(&self, text: &str) -> Result<ByteStream>;
}

// ─── Credential Port ─────────────────────────────────────────

/// Source of the bearer token attached to API requests
pub trait CredentialPort {
    fn bearer_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

// ─── Identity Port ───────────────────────────────────────────

/// External identity provider that issues and refreshes tokens
#[async_trait(?Send)]
pub trait IdentityPort {
    /// Authenticate the user. `None` when the provider declined to sign in.
    async fn init(&self) -> Result<Option<String>>;

    /// Refresh the token if it expires within `min_validity_secs`.
    /// `Some` carries the new token; `None` means the current one is still good.
    async fn refresh(&self, min_validity_secs: u32) -> Result<Option<String>>;
}
