//! Objects created while initializing the experiment.

use std::collections::BTreeMap;
use std::fmt;

use crate::backend::{ExperimentDataset, LearnerModel};

/// Position of a model in the configuration, plus its replica when replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelKey {
    /// 1-based model index; 0 is reserved for the baseline.
    pub model: usize,
    pub replica: Option<usize>,
}

impl ModelKey {
    pub const BASELINE: ModelKey = ModelKey {
        model: 0,
        replica: None,
    };

    pub fn single(model: usize) -> Self {
        Self {
            model,
            replica: None,
        }
    }

    pub fn replica(model: usize, replica: usize) -> Self {
        Self {
            model,
            replica: Some(replica),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.replica {
            Some(replica) => write!(f, "model_{}.{}", self.model, replica),
            None => write!(f, "model_{}", self.model),
        }
    }
}

/// Datasets and models owned by the session once initialization succeeds.
#[derive(Debug, Default)]
pub struct RuntimeState {
    /// Dataset produced by the import step; source for fixed-init clones.
    pub dataset: Option<Box<dyn ExperimentDataset>>,
    /// Random-strategy reference model used for the max-accuracy estimate.
    pub baseline_model: Option<Box<dyn LearnerModel>>,
    pub baseline_accuracy: Option<f32>,
    pub models: BTreeMap<ModelKey, Box<dyn LearnerModel>>,
}

impl RuntimeState {
    pub fn model(&self, key: ModelKey) -> Option<&dyn LearnerModel> {
        if key == ModelKey::BASELINE {
            return self.baseline_model.as_deref();
        }
        self.models.get(&key).map(|model| model.as_ref())
    }

    pub fn model_keys(&self) -> impl Iterator<Item = ModelKey> + '_ {
        self.models.keys().copied()
    }

    /// Replicas of the 1-based model `index`, in replica order.
    pub fn replicas_of(&self, index: usize) -> impl Iterator<Item = (ModelKey, &dyn LearnerModel)> {
        self.models
            .range(ModelKey::single(index)..ModelKey::single(index + 1))
            .map(|(key, model)| (*key, model.as_ref()))
    }
}
