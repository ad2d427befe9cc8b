//! Chat session — drives the network side of every user action.
//!
//! The session never touches the transcript. It talks to the API port,
//! decodes streams, and publishes `Action`s and `Notice`s on the event bus;
//! the UI folds those actions with the reducer.
//!
//! All methods take `&self` so the app can hold the session in an `Rc` and
//! spawn several operations with `wasm_bindgen_futures::spawn_local`
//! (e.g. a clear while a stream is still running).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{abortable, AbortHandle, Aborted};
use futures::stream::StreamExt;
use chat_types::{
    ChatError, Result,
    config::{AbruptClosePolicy, ChatMode},
    event::{Notice, StreamEvent},
};
use crate::decoder::{decode_stream, ContentAccumulator};
use crate::event_bus::EventBus;
use crate::ports::{ChatApiPort, CredentialPort};
use crate::reducer::Action;

const LOGIN_REQUIRED: &str = "You must be logged in!";

pub struct ChatSession {
    api: Rc<dyn ChatApiPort>,
    credentials: Rc<dyn CredentialPort>,
    event_bus: EventBus,
    abrupt_close: AbruptClosePolicy,
    in_flight: Cell<bool>,
    abort: RefCell<Option<AbortHandle>>,
}

impl ChatSession {
    pub fn new(
        api: Rc<dyn ChatApiPort>,
        credentials: Rc<dyn CredentialPort>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            api,
            credentials,
            event_bus,
            abrupt_close: AbruptClosePolicy::Complete,
            in_flight: Cell::new(false),
            abort: RefCell::new(None),
        }
    }

    pub fn with_abrupt_close(mut self, policy: AbruptClosePolicy) -> Self {
        self.abrupt_close = policy;
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// A send or stream is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    /// Replace the transcript with the server's history.
    pub async fn load_history(&self) -> Result<()> {
        self.require_auth()?;
        match self.api.fetch_history().await {
            Ok(messages) => {
                log::info!("Loaded {} history messages", messages.len());
                self.event_bus.dispatch(Action::SetHistory(messages));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load chat history: {}", e);
                self.event_bus
                    .notify(Notice::error("Error", "Failed to load chat history"));
                Err(e)
            }
        }
    }

    /// Submit `text` as a user message and request a reply in `mode`.
    ///
    /// Blank input is ignored. A second send while one is in flight is
    /// refused with `ChatError::Busy`, so at most one message streams at a time.
    pub async fn send(&self, text: &str, mode: ChatMode) -> Result<()> {
        self.require_auth()?;
        if text.trim().is_empty() {
            return Ok(());
        }
        if self.in_flight.replace(true) {
            log::warn!("Send refused: a request is already in flight");
            return Err(ChatError::Busy);
        }

        self.event_bus.dispatch(Action::submit_user_message(text));
        let result = match mode {
            ChatMode::Streaming => self.run_stream(text).await,
            ChatMode::Regular => self.run_regular(text).await,
        };
        self.in_flight.set(false);
        result
    }

    /// Put `content` back into the draft and send it again.
    pub async fn retry(&self, content: &str, mode: ChatMode) -> Result<()> {
        self.event_bus.dispatch(Action::SetDraft(content.to_string()));
        self.send(content, mode).await
    }

    /// Clear the transcript locally, then on the server.
    ///
    /// The local clear is optimistic and is never reverted: a server failure
    /// only produces a notification.
    pub async fn clear(&self) -> Result<()> {
        if self.abort_stream() {
            log::info!("Clear superseded the running stream");
        }
        self.event_bus.dispatch(Action::Clear);
        self.require_auth()?;

        match self.api.clear_history().await {
            Ok(()) => {
                self.event_bus.notify(Notice::success(
                    "Chat cleared",
                    "Chat history has been cleared from the server.",
                ));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to clear chat history from server: {}", e);
                self.event_bus.notify(Notice::error(
                    "Error",
                    "Failed to clear chat history from server",
                ));
                Err(e)
            }
        }
    }

    /// Stop the running stream. The partial reply is kept.
    /// Returns whether there was a stream to stop.
    pub fn cancel(&self) -> bool {
        let stopped = self.abort_stream();
        if stopped {
            self.event_bus
                .notify(Notice::info("Stopped", "Response generation was cancelled."));
        }
        stopped
    }

    fn abort_stream(&self) -> bool {
        match self.abort.borrow_mut().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn require_auth(&self) -> Result<()> {
        if self.credentials.is_authenticated() {
            Ok(())
        } else {
            self.event_bus
                .notify(Notice::warning("Not signed in", LOGIN_REQUIRED));
            Err(ChatError::Unauthenticated)
        }
    }

    /// A request failed before producing any message-level action.
    fn report_request_failure(&self, description: &str, error: &ChatError) {
        log::error!("{}: {}", description, error);
        self.event_bus.notify(Notice::error("Error", description));
        self.event_bus.dispatch(Action::SetLoading(false));
    }

    async fn run_regular(&self, text: &str) -> Result<()> {
        match self.api.send_message(text).await {
            Ok(message) => {
                self.event_bus
                    .dispatch(Action::AppendAssistantMessage(message));
                Ok(())
            }
            Err(e) => {
                self.report_request_failure("Failed to send message", &e);
                Err(e)
            }
        }
    }

    /// Open the stream and fold its events. Opening and reading run under one
    /// abort handle, so a cancel or clear stops the reply in either phase.
    async fn run_stream(&self, text: &str) -> Result<()> {
        let (id, begin) = Action::begin_assistant_stream();
        let mut content = ContentAccumulator::new();

        let (reply, handle) = abortable(self.stream_reply(text, &id, begin, &mut content));
        *self.abort.borrow_mut() = Some(handle);
        let result = reply.await;
        self.abort.borrow_mut().take();

        match result {
            Ok(result) => result,
            Err(Aborted) => {
                // keep what arrived so far
                log::info!("Stream {} cancelled after {} bytes", id, content.as_str().len());
                self.event_bus.dispatch(Action::CompleteStream { id });
                Err(ChatError::Cancelled)
            }
        }
    }

    async fn stream_reply(
        &self,
        text: &str,
        id: &str,
        begin: Action,
        content: &mut ContentAccumulator,
    ) -> Result<()> {
        let chunks = match self.api.stream_message(text).await {
            Ok(chunks) => chunks,
            Err(e) => {
                self.report_request_failure("Failed to send message with streaming", &e);
                return Err(e);
            }
        };
        self.event_bus.dispatch(begin);

        let mut events = Box::pin(decode_stream(chunks, self.abrupt_close));
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Content(delta) => {
                    let full = content.push(&delta).to_string();
                    self.event_bus.dispatch(Action::ApplyContentDelta {
                        id: id.to_string(),
                        content: full,
                    });
                }
                StreamEvent::Done => break,
                StreamEvent::Error(error) => {
                    log::error!("Stream error: {}", error);
                    self.event_bus
                        .notify(Notice::error("Error", format!("Error: {}", error)));
                    self.event_bus.dispatch(Action::FailStream {
                        id: Some(id.to_string()),
                        error: error.clone(),
                    });
                    return Err(ChatError::Stream(error));
                }
            }
        }

        self.event_bus
            .dispatch(Action::CompleteStream { id: id.to_string() });
        Ok(())
    }
}
