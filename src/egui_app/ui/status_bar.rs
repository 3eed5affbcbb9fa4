use eframe::egui::{self, Frame, Margin, RichText, StrokeKind};

use super::{EguiApp, style};

impl EguiApp {
    pub(super) fn render_status(&mut self, ctx: &egui::Context) {
        let theme = self.controller.ui.theme;
        let palette = style::palette(theme);
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                Frame::new()
                    .fill(palette.card)
                    .stroke(style::section_stroke(theme))
                    .inner_margin(Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| {
                let status = &self.controller.ui.status;
                ui.horizontal(|ui| {
                    ui.add_space(6.0);
                    let (badge_rect, _) =
                        ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                    ui.painter().rect_filled(badge_rect, 0.0, status.badge_color);
                    ui.painter().rect_stroke(
                        badge_rect,
                        0.0,
                        style::section_stroke(theme),
                        StrokeKind::Inside,
                    );
                    ui.add_space(8.0);
                    ui.label(RichText::new(&status.badge_label).color(palette.text));
                    ui.separator();
                    ui.label(RichText::new(&status.text).color(palette.text))
                        .on_hover_text(status.log_text());
                });
            });
    }
}
