use std::path::PathBuf;

use rfd::FileDialog;
use tracing::warn;

use super::*;
use crate::egui_app::state::DatasetFile;
use crate::uploads::{NPY_EXTENSION, UploadedFile};

impl EguiController {
    /// Pick a `.npy` file for `slot` with the native dialog.
    pub fn pick_dataset_file(&mut self, slot: DatasetFile) {
        let Some(path) = FileDialog::new()
            .add_filter("NumPy array", &[NPY_EXTENSION])
            .pick_file()
        else {
            return;
        };
        self.load_dataset_file(slot, path);
    }

    /// Read `path` into the dataset form.
    pub fn load_dataset_file(&mut self, slot: DatasetFile, path: PathBuf) {
        match UploadedFile::read(&path) {
            Ok(file) => {
                let name = file.name.clone();
                *self.ui.dataset.slot_mut(slot) = Some(file);
                self.set_status(format!("{} file: {name}", slot.label()), StatusTone::Info);
            }
            Err(err) => {
                warn!("Rejected {} file {}: {err}", slot.label(), path.display());
                self.set_status(err.to_string(), StatusTone::Error);
            }
        }
    }

    /// "validate import dataset": copy the picked files and load the dataset.
    pub fn validate_import(&mut self) {
        let request = self.ui.dataset.request();
        let result = self.session.import_dataset(
            &request,
            &self.settings.data_dir,
            self.settings.size_init_per_class,
            self.backend.as_ref(),
        );
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                warn!("Dataset import refused: {err}");
                self.set_status(err.to_string(), StatusTone::Error);
                return;
            }
        };
        let mut parts = Vec::with_capacity(2);
        match &report.dataset {
            Ok(dataset) => {
                parts.push(format!("data & labels imported ({} classes)", dataset.classes))
            }
            Err(err) => parts.push(err.to_string()),
        }
        match &report.unlabeled {
            Some(Ok(_)) => parts.push("unlabeled data imported".to_string()),
            Some(Err(err)) => {
                warn!("Unlabeled data not imported: {err}");
                parts.push(err.to_string());
            }
            None => {}
        }
        let tone = if report.is_complete() {
            self.ui.dataset.editing = false;
            StatusTone::Info
        } else if report.dataset.is_ok() {
            StatusTone::Warning
        } else {
            StatusTone::Error
        };
        self.set_status(parts.join(", "), tone);
    }
}
