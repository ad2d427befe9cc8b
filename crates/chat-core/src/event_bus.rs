//! Simple event bus for decoupled communication between the chat session
//! and the UI.
//!
//! The bus is single-threaded (WASM constraint) and uses interior mutability
//! via RefCell. Events are buffered and drained by the UI on each frame,
//! which folds the actions into its `SessionState`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use chat_types::event::Notice;
use crate::reducer::Action;

/// What the session publishes
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A transcript transition for the reducer
    Dispatch(Action),
    /// A transient notification for the user
    Notify(Notice),
}

/// Shared event bus — clone-cheap via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn emit(&self, event: ChatEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    pub fn dispatch(&self, action: Action) {
        self.emit(ChatEvent::Dispatch(action));
    }

    pub fn notify(&self, notice: Notice) {
        self.emit(ChatEvent::Notify(notice));
    }

    /// Drain all pending events. Called by the UI layer each frame.
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Check if there are pending events (useful for egui repaint triggers).
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
