use crate::session::{Device, ExperimentConfig, SamplingStrategy, Task};
use crate::setup::ImportRequest;
use crate::uploads::UploadedFile;

/// Which file slot a picker fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetFile {
    Data,
    Labels,
    Unlabeled,
}

impl DatasetFile {
    pub fn label(self) -> &'static str {
        match self {
            DatasetFile::Data => "data",
            DatasetFile::Labels => "labels",
            DatasetFile::Unlabeled => "unlabeled data",
        }
    }
}

/// Dataset import form.
#[derive(Clone, Debug, Default)]
pub struct DatasetFormState {
    pub data: Option<UploadedFile>,
    pub labels: Option<UploadedFile>,
    pub add_unlabeled: bool,
    pub unlabeled: Option<UploadedFile>,
    /// Form is open even though a dataset is already imported.
    pub editing: bool,
}

impl DatasetFormState {
    pub fn slot_mut(&mut self, file: DatasetFile) -> &mut Option<UploadedFile> {
        match file {
            DatasetFile::Data => &mut self.data,
            DatasetFile::Labels => &mut self.labels,
            DatasetFile::Unlabeled => &mut self.unlabeled,
        }
    }

    pub fn slot(&self, file: DatasetFile) -> Option<&UploadedFile> {
        match file {
            DatasetFile::Data => self.data.as_ref(),
            DatasetFile::Labels => self.labels.as_ref(),
            DatasetFile::Unlabeled => self.unlabeled.as_ref(),
        }
    }

    pub fn request(&self) -> ImportRequest {
        ImportRequest {
            data: self.data.clone(),
            labels: self.labels.clone(),
            add_unlabeled: self.add_unlabeled,
            unlabeled: self.unlabeled.clone().filter(|_| self.add_unlabeled),
        }
    }
}

/// Task picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFormState {
    pub selected: Task,
    pub editing: bool,
}

impl Default for TaskFormState {
    fn default() -> Self {
        Self {
            selected: Task::Classification,
            editing: false,
        }
    }
}

/// One row of the model form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelDraft {
    pub strategy: SamplingStrategy,
    pub replicas: u32,
}

impl Default for ModelDraft {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::Random,
            replicas: 1,
        }
    }
}

/// Model list form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelsFormState {
    pub device: Device,
    pub fixed_data_init: bool,
    pub drafts: Vec<ModelDraft>,
    pub editing: bool,
    /// Whether the form has been applied to the session at least once.
    pub applied: bool,
}

impl Default for ModelsFormState {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            fixed_data_init: true,
            drafts: Vec::new(),
            editing: false,
            applied: false,
        }
    }
}

impl ModelsFormState {
    /// Grow or shrink the draft list, keeping existing rows.
    pub fn set_count(&mut self, count: usize) {
        self.drafts.resize(count, ModelDraft::default());
    }

    /// Refill the drafts from the committed configuration.
    pub fn load_from(&mut self, config: &ExperimentConfig) {
        self.device = config.device;
        self.fixed_data_init = config.fixed_data_init;
        self.drafts = config
            .models
            .iter()
            .map(|spec| ModelDraft {
                strategy: spec.sampling_strategy,
                replicas: spec.replica_count.get(),
            })
            .collect();
    }
}
