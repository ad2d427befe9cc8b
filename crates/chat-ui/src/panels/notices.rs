//! Toast notifications, stacked in the top-right corner.

use egui::{self, Align2, RichText, Vec2};
use crate::state::UiState;
use crate::theme::*;

const TOAST_WIDTH: f32 = 280.0;

/// Show the active notices. Clicking one dismisses it.
pub fn notices_overlay(ctx: &egui::Context, state: &mut UiState) {
    if state.notices.is_empty() {
        return;
    }

    let mut dismissed = None;
    egui::Area::new(egui::Id::new("notices"))
        .anchor(Align2::RIGHT_TOP, Vec2::new(-12.0, 44.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            ui.set_max_width(TOAST_WIDTH);
            for (i, active) in state.notices.iter().enumerate() {
                let color = notice_color(active.notice.level);
                let response = egui::Frame::default()
                    .fill(BG_SECONDARY)
                    .stroke(egui::Stroke::new(1.0, color))
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_width(TOAST_WIDTH);
                        ui.label(RichText::new(&active.notice.title).color(color).strong());
                        ui.label(RichText::new(&active.notice.description).color(TEXT_PRIMARY));
                    })
                    .response
                    .interact(egui::Sense::click());
                if response.clicked() {
                    dismissed = Some(i);
                }
                ui.add_space(6.0);
            }
        });

    if let Some(index) = dismissed {
        state.dismiss_notice(index);
    }
}
