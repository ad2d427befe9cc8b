//! Chat panel — displays the transcript and the input field.

use chrono::{DateTime, Local};
use egui::text::{LayoutJob, TextFormat};
use egui::{self, Align, Key, Layout, Modifiers, RichText, ScrollArea, Vec2};

use chat_types::event::Notice;
use chat_types::message::{Message, Role};
use crate::highlight::CodeSegment;
use crate::markdown::{Block, BlockCache, RenderedReply, Span};
use crate::state::{UiIntent, UiState};
use crate::theme::*;

const INPUT_ID: &str = "chat_input";
const STREAMING_CURSOR: &str = "▊";

/// Render the chat panel. Returns what the user asked for, if anything.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<UiIntent> {
    let mut intent = None;
    let mut copied: Option<String> = None;
    let now = ui.input(|i| i.time);
    let busy = state.is_busy();

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                let available_height = ui.available_height() - 90.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        let UiState { session, markdown, copied_code, .. } = &mut *state;
                        let copied_now = copied_code.as_ref().map(|(code, _)| code.as_str());
                        for message in &session.transcript {
                            let action = render_message(ui, message, markdown, copied_now, busy);
                            match action {
                                Some(MessageAction::Retry(content)) => {
                                    intent = Some(UiIntent::Retry(content))
                                }
                                Some(MessageAction::Copy(code)) => copied = Some(code),
                                None => {}
                            }
                            ui.add_space(6.0);
                        }
                    });

                ui.add_space(8.0);

                if let Some(input_intent) = input_row(ui, state) {
                    intent = Some(input_intent);
                }
            });
        });

    if let Some(code) = copied {
        ui.ctx().copy_text(code.clone());
        state.mark_copied(&code, now);
        state.push_notice(Notice::success("Copied", "Code copied to clipboard!"), now);
    }

    intent
}

enum MessageAction {
    Retry(String),
    Copy(String),
}

fn input_row(ui: &mut egui::Ui, state: &mut UiState) -> Option<UiIntent> {
    let mut intent = None;
    let input_id = egui::Id::new(INPUT_ID);

    // Enter sends; Shift+Enter falls through to the text edit as a newline.
    let has_focus = ui.memory(|m| m.has_focus(input_id));
    let enter_pressed = has_focus
        && ui.input_mut(|i| !i.modifiers.shift && i.consume_key(Modifiers::NONE, Key::Enter));

    ui.horizontal(|ui| {
        let mut draft = state.session.pending_input.clone();
        let input = egui::TextEdit::multiline(&mut draft)
            .id(input_id)
            .hint_text("Type your message... (Shift+Enter for a new line)")
            .desired_rows(2)
            .desired_width(ui.available_width() - 70.0)
            .font(egui::FontId::proportional(14.0));
        let response = ui.add(input);
        if response.changed() {
            state.set_draft(draft);
        }

        if state.is_busy() && state.session.streaming_message().is_some() {
            let stop = ui.add(
                egui::Button::new(RichText::new("Stop").color(TEXT_PRIMARY))
                    .fill(WARNING.linear_multiply(0.6))
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(60.0, 0.0)),
            );
            if stop.clicked() {
                intent = Some(UiIntent::Cancel);
            }
            return;
        }

        let send_enabled = state.session.can_submit();
        let send_btn = ui.add_enabled(
            send_enabled,
            egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(60.0, 0.0)),
        );

        if send_enabled && (enter_pressed || send_btn.clicked()) {
            intent = Some(UiIntent::Send(state.session.pending_input.trim().to_string()));
            response.request_focus();
        }
    });

    intent
}

fn render_message(
    ui: &mut egui::Ui,
    message: &Message,
    markdown: &mut BlockCache,
    copied_code: Option<&str>,
    busy: bool,
) -> Option<MessageAction> {
    let mut action = None;
    let (label_color, bg) = role_colors(message.role);

    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            let mut title = message.role.label().to_string();
            if message.streaming {
                title.push_str(" (typing...)");
            }
            ui.label(RichText::new(title).color(label_color).strong().small());

            match message.role {
                Role::Assistant => {
                    let reply = markdown.render(&message.id, &message.content);
                    if let Some(code) = render_blocks(ui, reply, copied_code) {
                        action = Some(MessageAction::Copy(code));
                    }
                    if message.streaming {
                        ui.label(RichText::new(STREAMING_CURSOR).color(ACCENT).strong());
                    }
                }
                Role::System if message.is_error() => {
                    egui::Frame::default()
                        .fill(CODE_BG)
                        .corner_radius(PANEL_ROUNDING)
                        .inner_margin(8.0)
                        .show(ui, |ui| {
                            ScrollArea::vertical()
                                .id_salt(("error", &message.id))
                                .max_height(300.0)
                                .show(ui, |ui| {
                                    ui.label(RichText::new(&message.content).monospace().color(ERROR));
                                });
                        });
                }
                _ => {
                    ui.label(RichText::new(&message.content).color(TEXT_PRIMARY));
                }
            }

            if let Some(references) = message.references.as_ref().filter(|r| !r.is_empty()) {
                ui.separator();
                ui.label(RichText::new("References:").color(TEXT_PRIMARY).strong());
                for reference in references {
                    ui.label(RichText::new(format!("• {}", reference)).color(TEXT_SECONDARY));
                }
            }

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(display_time(&message.timestamp))
                        .color(TEXT_SECONDARY)
                        .small(),
                );
                if message.role == Role::User {
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let retry = ui
                            .add_enabled(!busy, egui::Button::new("⟲ Retry").small())
                            .on_hover_text("Retry this message");
                        if retry.clicked() {
                            action = Some(MessageAction::Retry(message.content.clone()));
                        }
                    });
                }
            });
        });

    action
}

/// Lay out markdown blocks. Returns a code block's text when its Copy
/// button was clicked.
fn render_blocks(ui: &mut egui::Ui, reply: &RenderedReply, copied_code: Option<&str>) -> Option<String> {
    let mut copy = None;
    for (block, highlight) in reply.blocks.iter().zip(&reply.highlights) {
        match block {
            Block::Heading { level, spans } => {
                let size = match level {
                    1 => 22.0,
                    2 => 19.0,
                    3 => 17.0,
                    _ => 15.0,
                };
                render_spans(ui, spans, |text| text.size(size).strong());
            }
            Block::Paragraph(spans) => render_spans(ui, spans, |text| text),
            Block::Quote(spans) => {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("▍").color(TEXT_SECONDARY));
                    render_spans(ui, spans, |text| text.italics().color(TEXT_SECONDARY));
                });
            }
            Block::ListItem { depth, marker, spans } => {
                ui.horizontal(|ui| {
                    ui.add_space(16.0 * *depth as f32);
                    ui.label(RichText::new(format!("{:>2}", marker)).color(TEXT_SECONDARY));
                    render_spans(ui, spans, |text| text);
                });
            }
            Block::Code { language, code } => {
                let copied = copied_code == Some(code.as_str());
                if code_block(ui, language.as_deref(), code, highlight.as_deref(), copied) {
                    copy = Some(code.clone());
                }
            }
            Block::Rule => {
                ui.separator();
            }
            Block::Table(rows) => {
                egui::Grid::new(ui.next_auto_id())
                    .striped(true)
                    .show(ui, |ui| {
                        for (i, row) in rows.iter().enumerate() {
                            for cell in row {
                                let text = RichText::new(cell).color(TEXT_PRIMARY);
                                ui.label(if i == 0 { text.strong() } else { text });
                            }
                            ui.end_row();
                        }
                    });
            }
        }
    }
    copy
}

/// Returns whether Copy was clicked
fn code_block(
    ui: &mut egui::Ui,
    language: Option<&str>,
    code: &str,
    highlight: Option<&[CodeSegment]>,
    copied: bool,
) -> bool {
    let mut clicked = false;
    egui::Frame::default()
        .fill(CODE_BG)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                if let Some(language) = language {
                    ui.label(RichText::new(language).color(TEXT_SECONDARY).small());
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    let label = if copied { "✔ Copied!" } else { "Copy" };
                    if ui.small_button(label).on_hover_text("Copy code").clicked() {
                        clicked = true;
                    }
                });
            });
            match highlight {
                Some(segments) => {
                    let font_id = egui::TextStyle::Monospace.resolve(ui.style());
                    let mut job = LayoutJob::default();
                    for segment in segments {
                        let format = TextFormat {
                            font_id: font_id.clone(),
                            color: segment.color,
                            italics: segment.italic,
                            ..Default::default()
                        };
                        job.append(&segment.text, 0.0, format);
                    }
                    ui.label(job);
                }
                None => {
                    ui.label(RichText::new(code).monospace().color(CODE_FG));
                }
            }
        });
    clicked
}

fn render_spans(ui: &mut egui::Ui, spans: &[Span], base: impl Fn(RichText) -> RichText) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for span in spans {
            for (i, line) in span.text.split('\n').enumerate() {
                if i > 0 {
                    ui.end_row();
                }
                if line.is_empty() {
                    continue;
                }
                let mut text = base(RichText::new(line).color(TEXT_PRIMARY));
                if span.style.strong {
                    text = text.strong();
                }
                if span.style.emphasis {
                    text = text.italics();
                }
                if span.style.strike {
                    text = text.strikethrough();
                }
                if span.style.code {
                    text = text.code();
                }
                match &span.link {
                    Some(url) => {
                        ui.hyperlink_to(text, url);
                    }
                    None => {
                        ui.label(text);
                    }
                }
            }
        }
    });
}

/// Local wall-clock time of an RFC 3339 timestamp; anything else is shown as is.
pub fn display_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(time) => time.with_timezone(&Local).format("%H:%M:%S").to_string(),
        Err(_) => timestamp.to_string(),
    }
}
