//! Dataset and model seam consumed by the setup workflow.
//!
//! The workflow never touches arrays or weights directly; it asks a [`Backend`] to
//! load datasets and build models, then drives them through the handle traits.

pub mod builtin;
pub mod dataset;
pub mod metrics;
pub mod mlp;
pub mod npy;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::session::{Device, SamplingStrategy};

pub use builtin::BuiltinBackend;

/// Paths a dataset is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub data_path: PathBuf,
    pub labels_path: PathBuf,
}

impl DatasetSource {
    pub fn new(data_path: impl Into<PathBuf>, labels_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            labels_path: labels_path.into(),
        }
    }
}

/// Arguments for [`Backend::build_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub strategy: SamplingStrategy,
    /// Identifier the backend uses for logs and artifacts, e.g. `model_2.1_bald`.
    pub model_id: String,
    pub device: Device,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid array file {path}: {source}")]
    Npy {
        path: PathBuf,
        source: npy::NpyError,
    },
    #[error("Data has {rows} rows but labels have {labels}")]
    RowMismatch { rows: usize, labels: usize },
    #[error("Dataset is empty")]
    EmptyDataset,
    #[error("Need at least 2 classes, found {0}")]
    TooFewClasses(usize),
    #[error("Device {0} is not available")]
    DeviceUnavailable(Device),
    #[error("Dataset type is not supported by this backend")]
    ForeignDataset,
    #[error("Training failed: {0}")]
    Training(String),
}

/// A loaded dataset split into an initial labeled pool and an unlabeled remainder.
pub trait ExperimentDataset: Send + fmt::Debug {
    /// Class names, ordered by class index.
    fn classes(&self) -> &[String];

    /// Total number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows currently in the labeled pool.
    fn labeled_len(&self) -> usize;

    fn source(&self) -> &DatasetSource;

    /// Deep copy: the returned dataset shares no mutable state with `self` and
    /// compares structurally equal to it at the time of the call.
    fn clone_dataset(&self) -> Box<dyn ExperimentDataset>;

    /// Downcasting hook so a backend can recover its own dataset type.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// A classifier paired with a sampling strategy over its own dataset.
pub trait LearnerModel: Send + fmt::Debug {
    fn model_id(&self) -> &str;

    fn strategy(&self) -> SamplingStrategy;

    fn dataset(&self) -> &dyn ExperimentDataset;

    /// Accuracy measured by the last fit, if the backend tracks one.
    fn accuracy(&self) -> Option<f32> {
        None
    }

    /// Train on every available label and return the reference accuracy.
    fn evaluate_max(&mut self) -> Result<f32, BackendError>;

    /// Fit the model on its initial labeled pool before the first query round.
    fn init_training(&mut self) -> Result<(), BackendError>;
}

/// Factory for datasets and models.
pub trait Backend: Send + Sync {
    fn load_dataset(
        &self,
        source: &DatasetSource,
        size_init_per_class: usize,
    ) -> Result<Box<dyn ExperimentDataset>, BackendError>;

    fn build_model(
        &self,
        request: ModelRequest,
        dataset: Box<dyn ExperimentDataset>,
    ) -> Result<Box<dyn LearnerModel>, BackendError>;

    fn cuda_available(&self) -> bool {
        false
    }

    /// Devices offered in the model form, preferred first.
    fn devices(&self) -> Vec<Device> {
        if self.cuda_available() {
            vec![Device::Cuda, Device::Cpu]
        } else {
            vec![Device::Cpu]
        }
    }
}
