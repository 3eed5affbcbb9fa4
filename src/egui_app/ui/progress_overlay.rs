use eframe::egui::{self, Align2, Area, Color32, Frame, Id, Order, ProgressBar, RichText, Stroke};

use super::style;
use crate::egui_app::state::ProgressOverlayState;
use crate::settings::Theme;

/// Render the modal progress overlay while models are initializing.
pub(super) fn render_progress_overlay(
    ctx: &egui::Context,
    theme: Theme,
    progress: &ProgressOverlayState,
) {
    if !progress.visible {
        return;
    }
    modal_backdrop(ctx, Id::new("progress_overlay_backdrop"));
    let palette = style::palette(theme);
    let title = if progress.title.is_empty() {
        "Working..."
    } else {
        progress.title.as_str()
    };
    Area::new(Id::new("progress_overlay_panel"))
        .order(Order::Tooltip)
        .constrain(true)
        .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            Frame::window(&ctx.style())
                .fill(palette.card)
                .stroke(Stroke::new(1.0, palette.outline))
                .show(ui, |ui| {
                    ui.heading(RichText::new(title).color(palette.text));
                    if let Some(detail) = progress.detail.as_deref() {
                        ui.add_space(6.0);
                        ui.label(RichText::new(detail).color(palette.text_dim));
                    }
                    ui.add_space(8.0);
                    let pct = (progress.fraction * 100.0).round().clamp(0.0, 100.0);
                    ui.add(
                        ProgressBar::new(progress.fraction)
                            .desired_width(260.0)
                            .animate(true)
                            .text(format!("{pct:.0}%")),
                    );
                });
        });
}

/// Dim the window and swallow pointer input behind the modal.
fn modal_backdrop(ctx: &egui::Context, id: Id) {
    let rect = ctx.viewport_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(Order::Tooltip, id.with("paint")));
    painter.rect_filled(rect, 0.0, Color32::from_rgba_premultiplied(0, 0, 0, 160));
    Area::new(id.with("blocker"))
        .order(Order::Tooltip)
        .fixed_pos(rect.min)
        .show(ctx, |ui| {
            ui.allocate_rect(rect, egui::Sense::click_and_drag());
        });
}
