use eframe::egui::{self, RichText, Ui};

use super::{EguiApp, edit_toggle, section, style};
use crate::session::Task;

impl EguiApp {
    pub(super) fn render_task_panel(&mut self, ui: &mut Ui) {
        let theme = self.controller.ui.theme;
        let palette = style::palette(theme);
        let editable = self.controller.session().is_editable();
        let committed = self.controller.session().config().task;

        section(ui, theme, "Task", |ui| {
            if let Some(task) = committed {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(task.as_str()).color(palette.text_dim));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        edit_toggle(ui, editable, &mut self.controller.ui.task.editing);
                    });
                });
            }
            if committed.is_some() && !(editable && self.controller.ui.task.editing) {
                return;
            }
            let mut selected = self.controller.ui.task.selected;
            ui.horizontal(|ui| {
                egui::ComboBox::from_id_salt("task_combo")
                    .selected_text(selected.as_str())
                    .show_ui(ui, |ui| {
                        for task in Task::ALL {
                            ui.selectable_value(&mut selected, task, task.as_str());
                        }
                    });
                if ui.button("validate task").clicked() {
                    self.controller.apply_task(selected);
                }
            });
            self.controller.ui.task.selected = selected;
        });
    }
}
