//! CPU backend: `.npy` datasets and an MC-dropout MLP learner.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::dataset::ArrayDataset;
use super::metrics::{ConfusionMatrix, accuracy};
use super::mlp::{MlpClassifier, TrainOptions, TrainSet};
use super::{
    Backend, BackendError, DatasetSource, ExperimentDataset, LearnerModel, ModelRequest,
};
use crate::session::{Device, SamplingStrategy};
use crate::settings::LearnerSettings;

/// Backend shipped with the application.
///
/// Every dataset split and model seed is drawn from one generator, so a fixed
/// `seed` reproduces a whole setup run.
#[derive(Debug)]
pub struct BuiltinBackend {
    settings: LearnerSettings,
    rng: Mutex<StdRng>,
}

impl BuiltinBackend {
    pub fn new(settings: LearnerSettings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            settings,
            rng: Mutex::new(rng),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl Backend for BuiltinBackend {
    fn load_dataset(
        &self,
        source: &DatasetSource,
        size_init_per_class: usize,
    ) -> Result<Box<dyn ExperimentDataset>, BackendError> {
        let dataset = self.with_rng(|rng| {
            ArrayDataset::load(
                source,
                size_init_per_class,
                self.settings.holdout_fraction,
                rng,
            )
        })?;
        debug!(
            rows = dataset.len(),
            labeled = dataset.labeled_len(),
            holdout = dataset.holdout_rows().len(),
            "dataset loaded"
        );
        Ok(Box::new(dataset))
    }

    fn build_model(
        &self,
        request: ModelRequest,
        dataset: Box<dyn ExperimentDataset>,
    ) -> Result<Box<dyn LearnerModel>, BackendError> {
        if request.device == Device::Cuda && !self.cuda_available() {
            return Err(BackendError::DeviceUnavailable(request.device));
        }
        if dataset.as_any().downcast_ref::<ArrayDataset>().is_none() {
            return Err(BackendError::ForeignDataset);
        }
        let seed = self.with_rng(|rng| rng.random::<u64>());
        Ok(Box::new(MlpLearner {
            model_id: request.model_id,
            strategy: request.strategy,
            dataset,
            options: TrainOptions::from(&self.settings),
            rng: StdRng::seed_from_u64(seed),
            classifier: None,
            accuracy: None,
        }))
    }
}

/// MLP classifier bound to its own dataset copy.
#[derive(Debug)]
pub struct MlpLearner {
    model_id: String,
    strategy: SamplingStrategy,
    dataset: Box<dyn ExperimentDataset>,
    options: TrainOptions,
    rng: StdRng,
    classifier: Option<MlpClassifier>,
    /// Holdout accuracy of the last fit.
    accuracy: Option<f32>,
}

impl MlpLearner {
    fn eval_rows(&self) -> Result<Vec<usize>, BackendError> {
        let data = self.arrays()?;
        Ok(if data.holdout_rows().is_empty() {
            data.trainable_rows()
        } else {
            data.holdout_rows().to_vec()
        })
    }

    fn arrays(&self) -> Result<&ArrayDataset, BackendError> {
        self.dataset
            .as_any()
            .downcast_ref::<ArrayDataset>()
            .ok_or(BackendError::ForeignDataset)
    }

    fn fit(&mut self, rows: &[usize]) -> Result<MlpClassifier, BackendError> {
        let data = self
            .dataset
            .as_any()
            .downcast_ref::<ArrayDataset>()
            .ok_or(BackendError::ForeignDataset)?;
        let set = TrainSet {
            rows: rows.iter().map(|&row| data.row(row)).collect(),
            targets: rows.iter().map(|&row| data.target(row)).collect(),
            n_classes: data.classes().len(),
        };
        MlpClassifier::train(&set, &self.options, &mut self.rng).map_err(BackendError::Training)
    }

    /// Accuracy of the current classifier on `rows`.
    fn score(&mut self, rows: &[usize]) -> Result<f32, BackendError> {
        let Some(classifier) = self.classifier.as_ref() else {
            return Err(BackendError::Training("model is not trained".to_string()));
        };
        let data = self
            .dataset
            .as_any()
            .downcast_ref::<ArrayDataset>()
            .ok_or(BackendError::ForeignDataset)?;
        let mut cm = ConfusionMatrix::new(classifier.n_classes());
        for &row in rows {
            let predicted = classifier.predict_class_index(data.row(row), &mut self.rng);
            cm.add(data.target(row), predicted);
        }
        Ok(accuracy(&cm))
    }
}

impl LearnerModel for MlpLearner {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn strategy(&self) -> SamplingStrategy {
        self.strategy
    }

    fn dataset(&self) -> &dyn ExperimentDataset {
        self.dataset.as_ref()
    }

    fn accuracy(&self) -> Option<f32> {
        self.accuracy
    }

    fn evaluate_max(&mut self) -> Result<f32, BackendError> {
        let train_rows = self.arrays()?.trainable_rows();
        let eval_rows = self.eval_rows()?;
        self.classifier = Some(self.fit(&train_rows)?);
        let score = self.score(&eval_rows)?;
        self.accuracy = Some(score);
        info!(model = %self.model_id, accuracy = score, rows = train_rows.len(), "max accuracy");
        Ok(score)
    }

    fn init_training(&mut self) -> Result<(), BackendError> {
        let labeled = self.arrays()?.labeled_rows().to_vec();
        if labeled.is_empty() {
            return Err(BackendError::Training("labeled pool is empty".to_string()));
        }
        let eval_rows = self.eval_rows()?;
        self.classifier = Some(self.fit(&labeled)?);
        let score = self.score(&eval_rows)?;
        self.accuracy = Some(score);
        debug!(model = %self.model_id, labeled = labeled.len(), accuracy = score, "initial fit done");
        Ok(())
    }
}
