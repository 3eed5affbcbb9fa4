//! Experiment configuration edited through the setup panels.

use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::backend::DatasetSource;

/// Learning task the experiment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    ObjectDetection,
    Classification,
    SemanticSegmentation,
}

impl Task {
    pub const ALL: [Task; 3] = [
        Task::ObjectDetection,
        Task::Classification,
        Task::SemanticSegmentation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Task::ObjectDetection => "object_detection",
            Task::Classification => "classification",
            Task::SemanticSegmentation => "semantic_segmentation",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute device requested for model training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    McDropout,
}

impl Algorithm {
    pub const ALL: [Algorithm; 1] = [Algorithm::McDropout];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::McDropout => "MC_dropout",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic used to rank unlabeled samples for labeling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SamplingStrategy {
    #[default]
    Random,
    MaxEntropy,
    Bald,
    VarRatio,
}

impl SamplingStrategy {
    pub const ALL: [SamplingStrategy; 4] = [
        SamplingStrategy::Random,
        SamplingStrategy::MaxEntropy,
        SamplingStrategy::Bald,
        SamplingStrategy::VarRatio,
    ];

    /// Identifier used in model ids, e.g. `max_entropy`.
    pub fn as_str(self) -> &'static str {
        match self {
            SamplingStrategy::Random => "random",
            SamplingStrategy::MaxEntropy => "max_entropy",
            SamplingStrategy::Bald => "bald",
            SamplingStrategy::VarRatio => "var_ratio",
        }
    }

    /// Label shown in the strategy combo box.
    pub fn label(self) -> &'static str {
        match self {
            SamplingStrategy::Random => "Random",
            SamplingStrategy::MaxEntropy => "Max_entropy",
            SamplingStrategy::Bald => "Bald",
            SamplingStrategy::VarRatio => "Var_ratio",
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured model: classifier, sampling strategy and replica count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub algorithm: Algorithm,
    pub sampling_strategy: SamplingStrategy,
    /// Independently initialized dataset+model pairs used for variance estimates.
    pub replica_count: NonZeroU32,
}

impl ModelSpec {
    pub fn new(sampling_strategy: SamplingStrategy, replica_count: NonZeroU32) -> Self {
        Self {
            algorithm: Algorithm::McDropout,
            sampling_strategy,
            replica_count,
        }
    }

    pub fn replicas(&self) -> usize {
        self.replica_count.get() as usize
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::new(SamplingStrategy::Random, NonZeroU32::MIN)
    }
}

/// Labeled samples per class drawn when a dataset is loaded.
pub const DEFAULT_SIZE_INIT_PER_CLASS: usize = 2;

/// Everything the user configures before initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    /// Imported data and labels files.
    pub dataset: Option<DatasetSource>,
    /// Initial labeled pool size per class, shared by every dataset load.
    pub size_init_per_class: usize,
    pub unlabeled_path: Option<PathBuf>,
    pub task: Option<Task>,
    pub device: Device,
    /// Clone the imported dataset for every model instead of reloading it.
    pub fixed_data_init: bool,
    pub models: Vec<ModelSpec>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            size_init_per_class: DEFAULT_SIZE_INIT_PER_CLASS,
            unlabeled_path: None,
            task: None,
            device: Device::default(),
            fixed_data_init: true,
            models: Vec::new(),
        }
    }
}

/// Bounds applied by the session setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigLimits {
    pub max_models: usize,
    pub max_replicas: u32,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_models: 10,
            max_replicas: 100,
        }
    }
}
