//! egui renderer for the setup window.

mod dataset_panel;
mod models_panel;
mod progress_overlay;
mod status_bar;
pub mod style;
mod task_panel;
mod update;

use std::sync::Arc;

use eframe::egui::{self, Frame, Margin, RichText, Ui};

use crate::backend::Backend;
use crate::egui_app::controller::EguiController;
use crate::session::SetupPhase;
use crate::settings::{AppSettings, Theme};

/// Renders the egui UI using the shared controller state.
pub struct EguiApp {
    controller: EguiController,
    visuals_set: bool,
}

impl EguiApp {
    pub fn new(settings: AppSettings, backend: Arc<dyn Backend>) -> Self {
        Self {
            controller: EguiController::new(settings, backend),
            visuals_set: false,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        ctx.set_visuals(style::visuals(self.controller.ui.theme));
        self.visuals_set = true;
    }

    fn render_ui(&mut self, ctx: &egui::Context) {
        self.render_status(ctx);
        let theme = self.controller.ui.theme;
        let palette = style::palette(theme);
        egui::CentralPanel::default()
            .frame(
                Frame::new()
                    .fill(palette.backdrop)
                    .inner_margin(Margin::symmetric(16, 12)),
            )
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading(RichText::new("Setup").color(palette.text));
                    ui.add_space(8.0);
                    self.render_dataset_panel(ui);
                    ui.add_space(8.0);
                    self.render_task_panel(ui);
                    ui.add_space(8.0);
                    self.render_models_panel(ui);
                    ui.add_space(12.0);
                    self.render_setup_footer(ui);
                });
            });
        progress_overlay::render_progress_overlay(ctx, theme, &self.controller.ui.progress);
    }

    fn render_setup_footer(&mut self, ui: &mut Ui) {
        let palette = style::palette(self.controller.ui.theme);
        match self.controller.phase() {
            SetupPhase::Finished => {
                ui.label(RichText::new("setup finished").color(palette.ok).strong());
                if let Some(accuracy) = self.controller.session().runtime().baseline_accuracy {
                    ui.label(format!("max accuracy (model_0): {:.1}%", accuracy * 100.0));
                }
            }
            SetupPhase::Initializing => {
                ui.label(RichText::new("initializing...").color(palette.text_dim));
            }
            SetupPhase::Failed => {
                ui.label(RichText::new("setup failed").color(palette.alert).strong());
                ui.label(RichText::new(&self.controller.ui.status.text).color(palette.text_dim));
                if ui.button("new session").clicked() {
                    self.controller.new_session();
                }
            }
            SetupPhase::Configuring | SetupPhase::Ready => {
                if ui.button("validate setup").clicked() {
                    self.controller.start_initialization();
                }
            }
        }
    }
}

/// Framed block used for the dataset, task and models sections.
fn section(ui: &mut Ui, theme: Theme, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    let palette = style::palette(theme);
    Frame::new()
        .fill(palette.card)
        .stroke(style::section_stroke(theme))
        .inner_margin(Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(title).color(palette.text).strong());
            ui.add_space(4.0);
            add_contents(ui);
        });
}

/// "edit" toggle shown once a section holds a committed value.
fn edit_toggle(ui: &mut Ui, enabled: bool, editing: &mut bool) {
    ui.add_enabled(enabled, egui::Checkbox::new(editing, "edit"));
}
