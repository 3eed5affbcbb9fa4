use eframe::egui::{self, RichText, Ui};

use super::{EguiApp, edit_toggle, section, style};
use crate::egui_app::state::ModelsFormState;
use crate::explanations;
use crate::session::{Algorithm, ConfigLimits, Device, ExperimentConfig, SamplingStrategy};
use crate::settings::Theme;

impl EguiApp {
    pub(super) fn render_models_panel(&mut self, ui: &mut Ui) {
        let theme = self.controller.ui.theme;
        let session = self.controller.session();
        let editable = session.is_editable();
        let limits = session.limits();
        let config = session.config().clone();
        let devices = self.controller.backend().devices();
        let committed = self.controller.ui.models.applied || !editable;

        section(ui, theme, "Models", |ui| {
            if committed {
                ui.horizontal(|ui| {
                    render_summary(ui, theme, &config);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                        edit_toggle(ui, editable, &mut self.controller.ui.models.editing);
                    });
                });
                if !(editable && self.controller.ui.models.editing) {
                    return;
                }
                ui.separator();
            }
            render_form(ui, theme, &mut self.controller.ui.models, limits, &devices);
            ui.add_space(4.0);
            if ui.button("validate models").clicked() {
                self.controller.apply_models();
            }
        });
    }
}

fn render_summary(ui: &mut Ui, theme: Theme, config: &ExperimentConfig) {
    let palette = style::palette(theme);
    ui.vertical(|ui| {
        ui.label(
            RichText::new(format!(
                "device: {} | fixed data init: {}",
                config.device, config.fixed_data_init
            ))
            .color(palette.text_dim),
        );
        if config.models.is_empty() {
            ui.label(RichText::new("no models (baseline only)").color(palette.text_dim));
        }
        for (position, spec) in config.models.iter().enumerate() {
            ui.label(
                RichText::new(format!(
                    "model_{}: {} / {} x{}",
                    position + 1,
                    spec.algorithm,
                    spec.sampling_strategy,
                    spec.replica_count
                ))
                .color(palette.text),
            );
        }
    });
}

fn render_form(
    ui: &mut Ui,
    theme: Theme,
    form: &mut ModelsFormState,
    limits: ConfigLimits,
    devices: &[Device],
) {
    let palette = style::palette(theme);
    ui.horizontal(|ui| {
        ui.label("device");
        egui::ComboBox::from_id_salt("device_combo")
            .selected_text(form.device.as_str())
            .show_ui(ui, |ui| {
                for device in devices {
                    ui.selectable_value(&mut form.device, *device, device.as_str());
                }
            });
        ui.checkbox(&mut form.fixed_data_init, "fixed data init");
    });
    let mut count = form.drafts.len();
    ui.horizontal(|ui| {
        ui.label("number of models");
        ui.add(egui::DragValue::new(&mut count).range(0..=limits.max_models));
    });
    if count != form.drafts.len() {
        form.set_count(count);
    }

    for (position, draft) in form.drafts.iter_mut().enumerate() {
        ui.add_space(4.0);
        ui.label(RichText::new(format!("model_{}", position + 1)).strong());
        egui::Grid::new(("model_grid", position))
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label("ml algorithm");
                ui.label(Algorithm::McDropout.as_str())
                    .on_hover_text(explanations::algorithm(Algorithm::McDropout));
                ui.end_row();

                ui.label("sampling strategy");
                egui::ComboBox::from_id_salt(("strategy_combo", position))
                    .selected_text(draft.strategy.label())
                    .show_ui(ui, |ui| {
                        for strategy in SamplingStrategy::ALL {
                            ui.selectable_value(&mut draft.strategy, strategy, strategy.label());
                        }
                    });
                ui.end_row();

                ui.label("samples");
                ui.add(egui::DragValue::new(&mut draft.replicas).range(1..=limits.max_replicas));
                ui.end_row();
            });
        ui.label(
            RichText::new(explanations::sampling(draft.strategy))
                .color(palette.text_dim)
                .small(),
        );
    }
}
