use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aclearn::backend::{
    Backend, BackendError, DatasetSource, ExperimentDataset, LearnerModel, ModelRequest,
};
use aclearn::session::SamplingStrategy;

/// Something the fake backend was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Load { dataset: usize },
    Clone { from: usize, to: usize },
    Build { model_id: String, dataset: usize },
    EvaluateMax { model_id: String },
    InitTraining { model_id: String },
}

#[derive(Debug, Default)]
struct Shared {
    events: Mutex<Vec<Event>>,
    next_dataset: AtomicUsize,
}

impl Shared {
    fn record(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(event);
    }

    fn next_id(&self) -> usize {
        self.next_dataset.fetch_add(1, Ordering::SeqCst)
    }
}

/// Backend double that records calls and can fail on a chosen model.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    shared: Arc<Shared>,
    classes: Vec<String>,
    fail_init_training: Option<String>,
    fail_load: bool,
}

impl FakeBackend {
    pub fn new(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|class| class.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Make `init_training` fail for `model_id`.
    pub fn failing_training(mut self, model_id: &str) -> Self {
        self.fail_init_training = Some(model_id.to_string());
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared
            .events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn loads(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Load { .. }))
            .count()
    }

    pub fn built_ids(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Build { model_id, .. } => Some(model_id),
                _ => None,
            })
            .collect()
    }
}

impl Backend for FakeBackend {
    fn load_dataset(
        &self,
        source: &DatasetSource,
        size_init_per_class: usize,
    ) -> Result<Box<dyn ExperimentDataset>, BackendError> {
        if self.fail_load {
            return Err(BackendError::EmptyDataset);
        }
        let id = self.shared.next_id();
        self.shared.record(Event::Load { dataset: id });
        Ok(Box::new(FakeDataset {
            id,
            shared: Arc::clone(&self.shared),
            source: source.clone(),
            classes: self.classes.clone(),
            labeled: size_init_per_class * self.classes.len(),
            rows: vec![1.0, 2.0, 3.0],
        }))
    }

    fn build_model(
        &self,
        request: ModelRequest,
        dataset: Box<dyn ExperimentDataset>,
    ) -> Result<Box<dyn LearnerModel>, BackendError> {
        let dataset_id = dataset
            .as_any()
            .downcast_ref::<FakeDataset>()
            .map(|fake| fake.id)
            .ok_or(BackendError::ForeignDataset)?;
        self.shared.record(Event::Build {
            model_id: request.model_id.clone(),
            dataset: dataset_id,
        });
        let fail_training = self.fail_init_training.as_deref() == Some(request.model_id.as_str());
        Ok(Box::new(FakeModel {
            shared: Arc::clone(&self.shared),
            model_id: request.model_id,
            strategy: request.strategy,
            dataset,
            fail_training,
        }))
    }
}

#[derive(Debug)]
pub struct FakeDataset {
    pub id: usize,
    shared: Arc<Shared>,
    source: DatasetSource,
    classes: Vec<String>,
    labeled: usize,
    pub rows: Vec<f32>,
}

impl FakeDataset {
    /// Content comparison that ignores the identity counter.
    pub fn same_content(&self, other: &FakeDataset) -> bool {
        self.source == other.source
            && self.classes == other.classes
            && self.labeled == other.labeled
            && self.rows == other.rows
    }
}

impl ExperimentDataset for FakeDataset {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn labeled_len(&self) -> usize {
        self.labeled
    }

    fn source(&self) -> &DatasetSource {
        &self.source
    }

    fn clone_dataset(&self) -> Box<dyn ExperimentDataset> {
        let id = self.shared.next_id();
        self.shared.record(Event::Clone { from: self.id, to: id });
        Box::new(FakeDataset {
            id,
            shared: Arc::clone(&self.shared),
            source: self.source.clone(),
            classes: self.classes.clone(),
            labeled: self.labeled,
            rows: self.rows.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct FakeModel {
    shared: Arc<Shared>,
    model_id: String,
    strategy: SamplingStrategy,
    dataset: Box<dyn ExperimentDataset>,
    fail_training: bool,
}

impl LearnerModel for FakeModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn strategy(&self) -> SamplingStrategy {
        self.strategy
    }

    fn dataset(&self) -> &dyn ExperimentDataset {
        self.dataset.as_ref()
    }

    fn evaluate_max(&mut self) -> Result<f32, BackendError> {
        self.shared.record(Event::EvaluateMax {
            model_id: self.model_id.clone(),
        });
        Ok(0.9)
    }

    fn init_training(&mut self) -> Result<(), BackendError> {
        self.shared.record(Event::InitTraining {
            model_id: self.model_id.clone(),
        });
        if self.fail_training {
            return Err(BackendError::Training("forced failure".to_string()));
        }
        Ok(())
    }
}
