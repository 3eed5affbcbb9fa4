use eframe::egui::{self, RichText, Ui};

use super::{EguiApp, edit_toggle, section, style};
use crate::egui_app::state::DatasetFile;

impl EguiApp {
    pub(super) fn render_dataset_panel(&mut self, ui: &mut Ui) {
        let theme = self.controller.ui.theme;
        let palette = style::palette(theme);
        let session = self.controller.session();
        let editable = session.is_editable();
        let imported = session.config().dataset.clone();
        let unlabeled = session.config().unlabeled_path.clone();
        let classes = session.labels().join(", ");

        section(ui, theme, "Dataset", |ui| {
            if let Some(source) = imported.as_ref() {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(source.data_path.display().to_string()).color(palette.text_dim));
                    ui.label(RichText::new(source.labels_path.display().to_string()).color(palette.text_dim));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        edit_toggle(ui, editable, &mut self.controller.ui.dataset.editing);
                    });
                });
                if let Some(path) = unlabeled.as_ref() {
                    ui.label(
                        RichText::new(format!("unlabeled: {}", path.display()))
                            .color(palette.text_dim),
                    );
                }
                ui.label(RichText::new(format!("classes: {classes}")).color(palette.text_dim));
            }
            if imported.is_none() || (editable && self.controller.ui.dataset.editing) {
                self.render_import_form(ui);
            }
        });
    }

    fn render_import_form(&mut self, ui: &mut Ui) {
        let palette = style::palette(self.controller.ui.theme);
        for slot in [DatasetFile::Data, DatasetFile::Labels] {
            self.render_file_row(ui, slot);
        }
        ui.checkbox(&mut self.controller.ui.dataset.add_unlabeled, "add unlabeled");
        if self.controller.ui.dataset.add_unlabeled {
            self.render_file_row(ui, DatasetFile::Unlabeled);
        }
        ui.add_space(4.0);
        if ui
            .button(RichText::new("validate import dataset").color(palette.text))
            .clicked()
        {
            self.controller.validate_import();
        }
    }

    fn render_file_row(&mut self, ui: &mut Ui, slot: DatasetFile) {
        let palette = style::palette(self.controller.ui.theme);
        let picked = self
            .controller
            .ui
            .dataset
            .slot(slot)
            .map(|file| file.name.clone());
        ui.horizontal(|ui| {
            if ui.button(format!("choose {}", slot.label())).clicked() {
                self.controller.pick_dataset_file(slot);
            }
            match picked {
                Some(name) => ui.label(RichText::new(name).color(palette.text)),
                None => ui.label(RichText::new("no file (.npy)").color(palette.text_dim)),
            };
        });
    }
}
