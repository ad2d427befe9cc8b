//! Header bar — title, streaming switch and Clear.

use egui::{self, Align, Layout, RichText};
use chat_types::config::ChatMode;
use crate::state::{UiIntent, UiState};
use crate::theme::*;

/// Render the header. Mode changes are applied to `state` directly; Clear is
/// returned for the session. Both controls are locked while a request runs.
pub fn header_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<UiIntent> {
    let mut intent = None;
    let busy = state.is_busy();

    ui.horizontal(|ui| {
        ui.label(
            RichText::new("AI Chat Assistant")
                .strong()
                .color(ACCENT)
                .size(16.0),
        );
        if busy {
            ui.spinner();
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.add_enabled(!busy, egui::Button::new("🗑 Clear")).clicked() {
                intent = Some(UiIntent::Clear);
            }

            let mut streaming = state.session.mode == ChatMode::Streaming;
            if ui
                .add_enabled(!busy, egui::Checkbox::new(&mut streaming, ""))
                .on_hover_text("Stream replies as they are generated")
                .changed()
            {
                let mode = if streaming { ChatMode::Streaming } else { ChatMode::Regular };
                log::info!("Reply mode set to {}", mode.label());
                state.set_mode(mode);
            }
            ui.label(RichText::new("Streaming:").color(TEXT_SECONDARY));
        });
    });

    intent
}
