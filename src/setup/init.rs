//! Builds the baseline and configured models from a frozen configuration.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::progress::{BASELINE_SHARE, InitStage, ProgressSink, ProgressSlice, ProgressUpdate};
use crate::backend::{
    Backend, BackendError, DatasetSource, ExperimentDataset, LearnerModel, ModelRequest,
};
use crate::session::{ExperimentConfig, ModelKey, ModelSpec, SamplingStrategy};

/// Snapshot handed to [`run_initialization`].
#[derive(Debug)]
pub struct InitPlan {
    pub session_id: Uuid,
    pub config: ExperimentConfig,
    /// Deep copy of the imported dataset.
    pub base_dataset: Box<dyn ExperimentDataset>,
}

/// Models produced by a successful initialization.
#[derive(Debug, Default)]
pub struct InitOutcome {
    pub baseline_model: Option<Box<dyn LearnerModel>>,
    pub baseline_accuracy: Option<f32>,
    pub models: BTreeMap<ModelKey, Box<dyn LearnerModel>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    LoadDataset,
    BuildModel,
    EvaluateMax,
    InitTraining,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InitStep::LoadDataset => "loading dataset",
            InitStep::BuildModel => "building model",
            InitStep::EvaluateMax => "evaluating max accuracy",
            InitStep::InitTraining => "initializing training",
        })
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("{key} failed while {step}: {source}")]
    Backend {
        key: ModelKey,
        step: InitStep,
        source: BackendError,
    },
    #[error("No dataset source configured")]
    NoDatasetSource,
    #[error("Initialization worker stopped before reporting a result")]
    WorkerStopped,
    #[error("Failed to start initialization worker: {0}")]
    Spawn(std::io::Error),
}

/// Run the initialization routine to completion.
///
/// Progress reaches 0.5 after the baseline evaluation; each configured model then
/// owns an equal slice of the remaining half. The last update is always 1.0.
pub fn run_initialization(
    plan: InitPlan,
    backend: &dyn Backend,
    progress: &mut dyn ProgressSink,
) -> Result<InitOutcome, InitError> {
    let InitPlan {
        session_id,
        config,
        base_dataset,
    } = plan;
    let builder = ModelBuilder {
        backend,
        config: &config,
        base: base_dataset.as_ref(),
    };

    progress.report(ProgressUpdate {
        fraction: 0.0,
        stage: InitStage::EvaluateMax,
    });
    info!(%session_id, "model_0 evaluate max accuracy...");
    let mut baseline = builder.build(
        ModelKey::BASELINE,
        SamplingStrategy::Random,
        base_dataset.clone_dataset(),
    )?;
    let accuracy = baseline
        .evaluate_max()
        .map_err(|source| InitError::Backend {
            key: ModelKey::BASELINE,
            step: InitStep::EvaluateMax,
            source,
        })?;
    info!(%session_id, accuracy, "model_0 max accuracy calculated");
    progress.report(ProgressUpdate {
        fraction: BASELINE_SHARE,
        stage: InitStage::EvaluateMax,
    });

    let mut models = BTreeMap::new();
    let count = config.models.len();
    for (position, spec) in config.models.iter().enumerate() {
        let index = position + 1;
        let slice = ProgressSlice::for_model(index, count);
        builder.init_model(index, spec, slice, &mut models, progress)?;
    }

    progress.report(ProgressUpdate {
        fraction: 1.0,
        stage: InitStage::Finished,
    });
    info!(%session_id, models = models.len(), "setup finished");
    Ok(InitOutcome {
        baseline_model: Some(baseline),
        baseline_accuracy: Some(accuracy),
        models,
    })
}

struct ModelBuilder<'a> {
    backend: &'a dyn Backend,
    config: &'a ExperimentConfig,
    base: &'a dyn ExperimentDataset,
}

impl ModelBuilder<'_> {
    fn init_model(
        &self,
        index: usize,
        spec: &ModelSpec,
        slice: ProgressSlice,
        models: &mut BTreeMap<ModelKey, Box<dyn LearnerModel>>,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), InitError> {
        let replicas = spec.replicas();
        for replica in 0..replicas {
            let (key, position) = if replicas > 1 {
                (
                    ModelKey::replica(index, replica),
                    Some((replica + 1, replicas)),
                )
            } else {
                (ModelKey::single(index), None)
            };
            progress.report(ProgressUpdate {
                fraction: slice.at(replica as f32, replicas as f32),
                stage: InitStage::InitModel { key, position },
            });
            let dataset = self.dataset_for(key)?;
            let mut model = self.build(key, spec.sampling_strategy, dataset)?;
            progress.report(ProgressUpdate {
                fraction: slice.after_build(replica, replicas),
                stage: InitStage::InitTraining { key, position },
            });
            model.init_training().map_err(|source| InitError::Backend {
                key,
                step: InitStep::InitTraining,
                source,
            })?;
            info!(model = %key, strategy = %spec.sampling_strategy, "training initialized");
            progress.report(ProgressUpdate {
                fraction: slice.after_training(replica, replicas),
                stage: InitStage::InitTraining { key, position },
            });
            models.insert(key, model);
        }
        Ok(())
    }

    /// Clone of the imported dataset with fixed init, otherwise a fresh load.
    fn dataset_for(&self, key: ModelKey) -> Result<Box<dyn ExperimentDataset>, InitError> {
        if self.config.fixed_data_init {
            return Ok(self.base.clone_dataset());
        }
        let source: &DatasetSource = self
            .config
            .dataset
            .as_ref()
            .ok_or(InitError::NoDatasetSource)?;
        self.backend
            .load_dataset(source, self.config.size_init_per_class)
            .map_err(|source| InitError::Backend {
                key,
                step: InitStep::LoadDataset,
                source,
            })
    }

    fn build(
        &self,
        key: ModelKey,
        strategy: SamplingStrategy,
        dataset: Box<dyn ExperimentDataset>,
    ) -> Result<Box<dyn LearnerModel>, InitError> {
        let request = ModelRequest {
            strategy,
            model_id: model_id(key, strategy),
            device: self.config.device,
        };
        self.backend
            .build_model(request, dataset)
            .map_err(|source| InitError::Backend {
                key,
                step: InitStep::BuildModel,
                source,
            })
    }
}

/// Backend-facing identifier: `model_0` for the baseline, `<key>_<strategy>` otherwise.
pub fn model_id(key: ModelKey, strategy: SamplingStrategy) -> String {
    if key == ModelKey::BASELINE {
        key.to_string()
    } else {
        format!("{key}_{strategy}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_follow_key_and_strategy() {
        assert_eq!(model_id(ModelKey::BASELINE, SamplingStrategy::Random), "model_0");
        assert_eq!(
            model_id(ModelKey::single(1), SamplingStrategy::MaxEntropy),
            "model_1_max_entropy"
        );
        assert_eq!(
            model_id(ModelKey::replica(3, 2), SamplingStrategy::Bald),
            "model_3.2_bald"
        );
    }
}
