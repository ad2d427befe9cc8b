//! UI-level state that drives rendering.
//!
//! The transcript lives in a `SessionState` folded from the session's
//! actions each frame; notifications and small widget state sit beside it.

use chat_core::event_bus::ChatEvent;
use chat_core::reducer::{Action, SessionState};
use chat_types::config::ChatMode;
use chat_types::event::Notice;
use crate::markdown::BlockCache;

/// How long the "Copied!" label replaces a code block's Copy button
pub const COPIED_LABEL_SECS: f64 = 2.0;

/// Something the user asked for that needs the session
#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    Send(String),
    Retry(String),
    Clear,
    Cancel,
}

/// A notice currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNotice {
    pub notice: Notice,
    /// `egui::InputState::time` when it was first shown
    pub shown_at: f64,
}

/// State visible to UI panels
pub struct UiState {
    pub session: SessionState,
    pub notices: Vec<ActiveNotice>,
    pub notice_duration_secs: f64,
    /// Code block most recently copied, and when
    pub copied_code: Option<(String, f64)>,
    pub markdown: BlockCache,
}

impl UiState {
    pub fn new(mode: ChatMode, notice_duration_secs: f32) -> Self {
        Self {
            session: SessionState::new(mode),
            notices: Vec::new(),
            notice_duration_secs: notice_duration_secs as f64,
            copied_code: None,
            markdown: BlockCache::new(),
        }
    }

    /// Fold drained bus events into the state
    pub fn process_events(&mut self, events: Vec<ChatEvent>, now: f64) {
        for event in events {
            match event {
                ChatEvent::Dispatch(action) => self.session.apply(action),
                ChatEvent::Notify(notice) => self.push_notice(notice, now),
            }
        }
        self.markdown
            .retain(self.session.transcript.iter().map(|m| m.id.as_str()));
    }

    pub fn push_notice(&mut self, notice: Notice, now: f64) {
        self.notices.push(ActiveNotice { notice, shown_at: now });
    }

    /// Drop notices older than `notice_duration_secs` and stale copy feedback.
    pub fn expire(&mut self, now: f64) {
        let duration = self.notice_duration_secs;
        self.notices.retain(|n| now - n.shown_at < duration);
        if let Some((_, at)) = &self.copied_code {
            if now - at >= COPIED_LABEL_SECS {
                self.copied_code = None;
            }
        }
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    pub fn mark_copied(&mut self, code: &str, now: f64) {
        self.copied_code = Some((code.to_string(), now));
    }

    pub fn is_copied(&self, code: &str) -> bool {
        matches!(&self.copied_code, Some((copied, _)) if copied == code)
    }

    pub fn set_draft(&mut self, text: String) {
        self.session.apply(Action::SetDraft(text));
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.session.apply(Action::SetMode(mode));
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_loading
    }

    /// Whether something is animating and the UI should keep repainting
    pub fn needs_repaint(&self) -> bool {
        self.is_busy() || !self.notices.is_empty() || self.copied_code.is_some()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(ChatMode::Streaming, 4.0)
    }
}
