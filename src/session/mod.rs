//! Per-user session context: configuration, runtime objects and setup phase.
//!
//! The session is an explicit value owned by whoever drives the setup (the egui
//! controller or a test). Configuration writes go through the setters below, which
//! refuse edits once initialization has started.

mod config;
mod runtime;

pub use config::*;
pub use runtime::*;

use std::num::NonZeroU32;
use std::path::PathBuf;

use uuid::Uuid;

use crate::backend::{DatasetSource, ExperimentDataset};
use crate::setup::SetupError;

/// Class labels used before any dataset is imported.
pub const DEFAULT_LABELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Where the session sits in the setup workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
    /// Configuration is editable and incomplete.
    Configuring,
    /// Configuration is editable and has a task and a dataset.
    Ready,
    /// Initialization is running; configuration is frozen.
    Initializing,
    /// Models are built; configuration is frozen for the rest of the session.
    Finished,
    /// Initialization aborted; nothing was committed and configuration stays
    /// frozen for the rest of the session.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoredPhase {
    Configuring,
    Initializing,
    Finished,
    Failed,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    config: ExperimentConfig,
    pub(crate) runtime: RuntimeState,
    labels: Option<Vec<String>>,
    pub(crate) phase: StoredPhase,
    limits: ConfigLimits,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ConfigLimits::default())
    }
}

impl Session {
    pub fn new(limits: ConfigLimits) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            config: ExperimentConfig::default(),
            runtime: RuntimeState::default(),
            labels: None,
            phase: StoredPhase::Configuring,
            limits,
        };
        session.ensure_defaults();
        session
    }

    /// Fill values that are still absent; present values are left untouched.
    pub fn ensure_defaults(&mut self) {
        self.labels
            .get_or_insert_with(|| DEFAULT_LABELS.iter().map(|label| label.to_string()).collect());
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    pub fn limits(&self) -> ConfigLimits {
        self.limits
    }

    pub fn labels(&self) -> &[String] {
        self.labels.as_deref().unwrap_or_default()
    }

    pub fn phase(&self) -> SetupPhase {
        match self.phase {
            StoredPhase::Configuring if self.missing_elements() => SetupPhase::Configuring,
            StoredPhase::Configuring => SetupPhase::Ready,
            StoredPhase::Initializing => SetupPhase::Initializing,
            StoredPhase::Finished => SetupPhase::Finished,
            StoredPhase::Failed => SetupPhase::Failed,
        }
    }

    pub fn setup_finished(&self) -> bool {
        self.phase == StoredPhase::Finished
    }

    pub fn setup_failed(&self) -> bool {
        self.phase == StoredPhase::Failed
    }

    /// Only before the first initialization attempt; the gate never reopens.
    pub fn is_editable(&self) -> bool {
        self.phase == StoredPhase::Configuring
    }

    /// True while the task or the dataset is still unset.
    pub fn missing_elements(&self) -> bool {
        self.config.task.is_none() || self.runtime.dataset.is_none()
    }

    pub fn set_task(&mut self, task: Task) -> Result<(), SetupError> {
        self.ensure_editable()?;
        self.config.task = Some(task);
        Ok(())
    }

    pub fn set_device(&mut self, device: Device) -> Result<(), SetupError> {
        self.ensure_editable()?;
        self.config.device = device;
        Ok(())
    }

    pub fn set_fixed_data_init(&mut self, fixed: bool) -> Result<(), SetupError> {
        self.ensure_editable()?;
        self.config.fixed_data_init = fixed;
        Ok(())
    }

    /// Resize the model list, keeping existing entries and appending defaults.
    pub fn set_model_count(&mut self, count: usize) -> Result<(), SetupError> {
        self.ensure_editable()?;
        if count > self.limits.max_models {
            return Err(SetupError::TooManyModels {
                requested: count,
                max: self.limits.max_models,
            });
        }
        self.config.models.resize(count, ModelSpec::default());
        Ok(())
    }

    /// Replace the 1-based model `index`.
    pub fn set_model(&mut self, index: usize, spec: ModelSpec) -> Result<(), SetupError> {
        self.ensure_editable()?;
        if spec.replica_count.get() > self.limits.max_replicas {
            return Err(SetupError::TooManyReplicas {
                requested: spec.replica_count.get(),
                max: self.limits.max_replicas,
            });
        }
        let count = self.config.models.len();
        let slot = index
            .checked_sub(1)
            .and_then(|pos| self.config.models.get_mut(pos))
            .ok_or(SetupError::NoSuchModel { index, count })?;
        *slot = spec;
        Ok(())
    }

    /// Replace the replica count of the 1-based model `index`; zero is rejected.
    pub fn set_replica_count(&mut self, index: usize, replicas: u32) -> Result<(), SetupError> {
        let replica_count = NonZeroU32::new(replicas).ok_or(SetupError::ZeroReplicas)?;
        let current = index
            .checked_sub(1)
            .and_then(|pos| self.config.models.get(pos))
            .copied()
            .unwrap_or_default();
        self.set_model(
            index,
            ModelSpec {
                replica_count,
                ..current
            },
        )
    }

    /// Record an imported dataset and adopt its class names as session labels.
    pub fn attach_dataset(
        &mut self,
        source: DatasetSource,
        size_init_per_class: usize,
        dataset: Box<dyn ExperimentDataset>,
    ) -> Result<(), SetupError> {
        self.ensure_editable()?;
        self.labels = Some(dataset.classes().to_vec());
        self.config.dataset = Some(source);
        self.config.size_init_per_class = size_init_per_class;
        self.runtime.dataset = Some(dataset);
        Ok(())
    }

    pub fn set_unlabeled_path(&mut self, path: PathBuf) -> Result<(), SetupError> {
        self.ensure_editable()?;
        self.config.unlabeled_path = Some(path);
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), SetupError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(SetupError::Frozen)
        }
    }
}
