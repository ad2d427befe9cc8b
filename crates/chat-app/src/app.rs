//! Main egui application — composes the panels and drives the chat session.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use egui::{self, CentralPanel, TopBottomPanel};

use chat_core::auth::{sign_in, CredentialStore};
use chat_core::event_bus::EventBus;
use chat_core::ports::IdentityPort;
use chat_core::session::ChatSession;
use chat_platform::http::HttpChatApi;
use chat_platform::identity::KeycloakIdentity;
use chat_platform::refresh::spawn_token_refresh;
use chat_types::config::ChatConfig;
use chat_types::event::Notice;
use chat_ui::panels::{chat, header, notices};
use chat_ui::state::{UiIntent, UiState};
use chat_ui::theme;

/// The main application state
pub struct ChatApp {
    ui_state: UiState,
    event_bus: EventBus,
    session: Rc<ChatSession>,
    first_frame: bool,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ChatConfig::from_env();
        log::info!("API base: {:?}", config.api_base);

        let event_bus = EventBus::new();
        let credentials = CredentialStore::new();
        let api = Rc::new(HttpChatApi::new(config.clone(), Rc::new(credentials.clone())));
        let session = Rc::new(
            ChatSession::new(api, Rc::new(credentials.clone()), event_bus.clone())
                .with_abrupt_close(config.abrupt_close),
        );

        Self::start_identity(
            credentials,
            session.clone(),
            config.clone(),
            cc.egui_ctx.clone(),
        );

        Self {
            ui_state: UiState::new(config.default_mode, config.notice_duration_secs),
            event_bus,
            session,
            first_frame: true,
        }
    }

    /// Sign in through Keycloak, keep the token fresh, then load the history.
    fn start_identity(
        credentials: CredentialStore,
        session: Rc<ChatSession>,
        config: ChatConfig,
        ctx: egui::Context,
    ) {
        wasm_bindgen_futures::spawn_local(async move {
            let identity: Rc<dyn IdentityPort> = match KeycloakIdentity::from_global() {
                Ok(identity) => Rc::new(identity),
                Err(e) => {
                    log::error!("Keycloak unavailable: {}", e);
                    session
                        .event_bus()
                        .notify(Notice::error("Authentication failed", e.to_string()));
                    ctx.request_repaint();
                    return;
                }
            };

            match sign_in(identity.as_ref(), &credentials).await {
                Ok(true) => {
                    spawn_token_refresh(identity, credentials, &config);
                    if let Err(e) = session.load_history().await {
                        log::warn!("History not loaded: {}", e);
                    }
                }
                Ok(false) => {
                    session.event_bus().notify(Notice::warning(
                        "Not signed in",
                        "You must be logged in!",
                    ));
                }
                Err(e) => {
                    log::error!("Keycloak initialization failed: {}", e);
                    session
                        .event_bus()
                        .notify(Notice::error("Authentication failed", e.to_string()));
                }
            }
            ctx.request_repaint();
        });
    }

    /// Run a session operation in the background. Failures have already been
    /// reported on the event bus by the session.
    fn spawn_session_task<F, Fut>(&self, ctx: &egui::Context, name: &'static str, task: F)
    where
        F: FnOnce(Rc<ChatSession>) -> Fut + 'static,
        Fut: Future<Output = chat_types::Result<()>> + 'static,
    {
        let session = self.session.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = task(session).await {
                log::debug!("{} ended with: {}", name, e);
            }
            ctx.request_repaint();
        });
    }

    fn handle_intent(&mut self, intent: UiIntent, ctx: &egui::Context) {
        let mode = self.ui_state.session.mode;
        match intent {
            UiIntent::Send(text) => {
                self.spawn_session_task(ctx, "send", move |session| async move {
                    session.send(&text, mode).await
                });
            }
            UiIntent::Retry(content) => {
                self.spawn_session_task(ctx, "retry", move |session| async move {
                    session.retry(&content, mode).await
                });
            }
            UiIntent::Clear => {
                self.spawn_session_task(ctx, "clear", |session| async move {
                    session.clear().await
                });
            }
            UiIntent::Cancel => {
                self.session.cancel();
            }
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        // Fold what the session published since the last frame
        let now = ctx.input(|i| i.time);
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events, now);
            ctx.request_repaint();
        }
        self.ui_state.expire(now);

        if self.ui_state.needs_repaint() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut intents = Vec::new();

        // ── Header ───────────────────────────────────────────
        TopBottomPanel::top("header").show(ctx, |ui| {
            intents.extend(header::header_panel(ui, &mut self.ui_state));
        });

        // ── Transcript + input ───────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            intents.extend(chat::chat_panel(ui, &mut self.ui_state));
        });

        notices::notices_overlay(ctx, &mut self.ui_state);

        for intent in intents {
            self.handle_intent(intent, ctx);
        }
    }
}
