//! Setup workflow: dataset import and the gate from configuring to running.
//!
//! `Configuring → Initializing → Finished | Failed` is one-way. Once
//! initialization starts the configuration stays frozen for the rest of the
//! session, whether the run succeeds or not.

pub mod init;
pub mod progress;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{Backend, BackendError, DatasetSource};
use crate::session::{Session, StoredPhase};
use crate::uploads::{self, UploadError, UploadedFile};

pub use init::{InitError, InitOutcome, InitPlan, InitStep, model_id, run_initialization};
pub use progress::{InitStage, NoProgress, ProgressSink, ProgressSlice, ProgressUpdate};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("missing data")]
    MissingData,
    #[error("missing unlabeled data")]
    MissingUnlabeledData,
    #[error("missing some elements")]
    MissingElements,
    #[error("setup is frozen once initialization has started")]
    Frozen,
    #[error("initialization is already running")]
    AlreadyInitializing,
    #[error("setup already finished")]
    AlreadyFinished,
    #[error("setup failed; start a new session to try again")]
    SetupFailed,
    #[error("at most {max} models can be configured (requested {requested})")]
    TooManyModels { requested: usize, max: usize },
    #[error("at most {max} samples per model are allowed (requested {requested})")]
    TooManyReplicas { requested: u32, max: u32 },
    #[error("a model needs at least one sample")]
    ZeroReplicas,
    #[error("model {index} does not exist ({count} configured)")]
    NoSuchModel { index: usize, count: usize },
    #[error("initialization result does not belong to this session")]
    NotInitializing,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("failed to load dataset: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Init(#[from] InitError),
}

/// Files picked in the dataset panel.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub data: Option<UploadedFile>,
    pub labels: Option<UploadedFile>,
    /// Whether the "add unlabeled" box is ticked.
    pub add_unlabeled: bool,
    pub unlabeled: Option<UploadedFile>,
}

/// The labeled dataset an import attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedDataset {
    pub source: DatasetSource,
    pub classes: usize,
}

/// Outcome of one "validate import" click.
///
/// The data/labels pair and the unlabeled file succeed or fail independently.
#[derive(Debug)]
pub struct ImportReport {
    pub dataset: Result<ImportedDataset, SetupError>,
    /// `None` when no unlabeled file was picked or asked for.
    pub unlabeled: Option<Result<PathBuf, SetupError>>,
}

impl ImportReport {
    /// Every requested part was stored.
    pub fn is_complete(&self) -> bool {
        self.dataset.is_ok() && self.unlabeled.as_ref().is_none_or(Result::is_ok)
    }
}

impl Session {
    /// Persist the picked files into `data_dir` and load the dataset.
    ///
    /// Only a frozen session refuses the whole import. Data and labels are
    /// saved and attached even when the unlabeled part is missing, and a picked
    /// unlabeled file is saved even when data or labels are missing.
    pub fn import_dataset(
        &mut self,
        request: &ImportRequest,
        data_dir: &Path,
        size_init_per_class: usize,
        backend: &dyn Backend,
    ) -> Result<ImportReport, SetupError> {
        if !self.is_editable() {
            return Err(SetupError::Frozen);
        }
        let dataset = self.import_labeled(request, data_dir, size_init_per_class, backend);
        if let Err(err) = &dataset {
            warn!("data & labels not imported: {err}");
        }
        let unlabeled = match (request.unlabeled.as_ref(), request.add_unlabeled) {
            (Some(file), _) => Some(self.import_unlabeled(data_dir, file)),
            (None, true) => Some(Err(SetupError::MissingUnlabeledData)),
            (None, false) => None,
        };
        Ok(ImportReport { dataset, unlabeled })
    }

    fn import_labeled(
        &mut self,
        request: &ImportRequest,
        data_dir: &Path,
        size_init_per_class: usize,
        backend: &dyn Backend,
    ) -> Result<ImportedDataset, SetupError> {
        let (Some(data), Some(labels)) = (request.data.as_ref(), request.labels.as_ref()) else {
            return Err(SetupError::MissingData);
        };
        let data_path = uploads::persist(data_dir, data)?;
        let labels_path = uploads::persist(data_dir, labels)?;
        let source = DatasetSource::new(data_path, labels_path);
        let dataset = backend.load_dataset(&source, size_init_per_class)?;
        let classes = dataset.classes().len();
        self.attach_dataset(source.clone(), size_init_per_class, dataset)?;
        info!(
            data = %source.data_path.display(),
            labels = %source.labels_path.display(),
            classes,
            "data & labels imported"
        );
        Ok(ImportedDataset { source, classes })
    }

    fn import_unlabeled(
        &mut self,
        data_dir: &Path,
        file: &UploadedFile,
    ) -> Result<PathBuf, SetupError> {
        let path = uploads::persist(data_dir, file)?;
        self.set_unlabeled_path(path.clone())?;
        info!(path = %path.display(), "unlabeled data imported");
        Ok(path)
    }

    /// Freeze the configuration and hand out the snapshot the routine runs on.
    ///
    /// Fails without touching the session when the task or dataset is missing.
    pub fn begin_initialization(&mut self) -> Result<InitPlan, SetupError> {
        match self.phase {
            StoredPhase::Finished => return Err(SetupError::AlreadyFinished),
            StoredPhase::Failed => return Err(SetupError::SetupFailed),
            StoredPhase::Initializing => return Err(SetupError::AlreadyInitializing),
            StoredPhase::Configuring => {}
        }
        let Some(dataset) = self.runtime.dataset.as_ref().filter(|_| self.config().task.is_some())
        else {
            warn!(session = %self.id(), "initialization refused: missing some elements");
            return Err(SetupError::MissingElements);
        };
        let plan = InitPlan {
            session_id: self.id(),
            config: self.config().clone(),
            base_dataset: dataset.clone_dataset(),
        };
        self.phase = StoredPhase::Initializing;
        info!(session = %self.id(), models = plan.config.models.len(), "initialization started");
        Ok(plan)
    }

    /// Commit a finished run.
    ///
    /// An error commits nothing and moves the session to `Failed`; the
    /// configuration stays frozen.
    pub fn finish_initialization(
        &mut self,
        result: Result<InitOutcome, InitError>,
    ) -> Result<(), SetupError> {
        if self.phase != StoredPhase::Initializing {
            return Err(SetupError::NotInitializing);
        }
        match result {
            Ok(outcome) => {
                self.runtime.baseline_model = outcome.baseline_model;
                self.runtime.baseline_accuracy = outcome.baseline_accuracy;
                self.runtime.models = outcome.models;
                self.phase = StoredPhase::Finished;
                Ok(())
            }
            Err(err) => {
                warn!(session = %self.id(), "initialization failed: {err}");
                self.phase = StoredPhase::Failed;
                Err(err.into())
            }
        }
    }

    /// Run the whole initialization on the calling thread.
    pub fn initialize(
        &mut self,
        backend: &dyn Backend,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), SetupError> {
        let plan = self.begin_initialization()?;
        let result = run_initialization(plan, backend, progress);
        self.finish_initialization(result)
    }
}
