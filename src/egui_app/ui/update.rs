use std::time::Duration;

use eframe::egui;

use super::EguiApp;

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        if self.controller.poll_initialization() {
            ctx.request_repaint();
        }
        if self.controller.init_in_progress() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
        self.render_ui(ctx);
    }
}
