mod support;

use std::num::NonZeroU32;

use aclearn::session::{
    ConfigLimits, Device, ModelKey, ModelSpec, SamplingStrategy, Session, SetupPhase, Task,
};
use aclearn::setup::{
    ImportRequest, InitError, InitStage, NoProgress, ProgressUpdate, SetupError,
};
use support::fake_backend::{Event, FakeBackend, FakeDataset};
use support::npy::uploaded;
use tempfile::TempDir;

struct Harness {
    temp: TempDir,
    backend: FakeBackend,
    session: Session,
}

impl Harness {
    fn new(backend: FakeBackend) -> Self {
        Self {
            temp: tempfile::tempdir().expect("create tempdir"),
            backend,
            session: Session::new(ConfigLimits::default()),
        }
    }

    fn import(&mut self) {
        let request = ImportRequest {
            data: Some(uploaded("x_train.npy", vec![1, 2, 3])),
            labels: Some(uploaded("y_train.npy", vec![4, 5])),
            ..ImportRequest::default()
        };
        let data_dir = self.temp.path().join("data");
        self.session
            .import_dataset(&request, &data_dir, 2, &self.backend)
            .expect("session accepts imports")
            .dataset
            .expect("import dataset");
    }

    fn ready(backend: FakeBackend, models: &[(SamplingStrategy, u32)]) -> Self {
        let mut harness = Self::new(backend);
        harness.import();
        harness.session.set_task(Task::Classification).unwrap();
        harness.session.set_model_count(models.len()).unwrap();
        for (position, (strategy, replicas)) in models.iter().enumerate() {
            let spec = ModelSpec::new(*strategy, NonZeroU32::new(*replicas).unwrap());
            harness.session.set_model(position + 1, spec).unwrap();
        }
        harness
    }

    fn initialize(&mut self) -> (Result<(), SetupError>, Vec<ProgressUpdate>) {
        let mut updates = Vec::new();
        let mut sink = |update: ProgressUpdate| updates.push(update);
        let result = self.session.initialize(&self.backend, &mut sink);
        (result, updates)
    }

    fn fractions(updates: &[ProgressUpdate]) -> Vec<f32> {
        updates.iter().map(|update| update.fraction).collect()
    }
}

fn assert_non_decreasing(fractions: &[f32]) {
    for pair in fractions.windows(2) {
        assert!(pair[1] >= pair[0], "progress went backwards: {fractions:?}");
    }
}

#[test]
fn missing_task_blocks_initialization() {
    let mut harness = Harness::new(FakeBackend::new(&["a", "b"]));
    harness.import();
    let events_before = harness.backend.events();

    let (result, updates) = harness.initialize();

    assert!(matches!(result, Err(SetupError::MissingElements)));
    assert_eq!(result.unwrap_err().to_string(), "missing some elements");
    assert!(updates.is_empty());
    assert!(!harness.session.setup_finished());
    assert_eq!(harness.session.phase(), SetupPhase::Configuring);
    assert!(harness.session.runtime().baseline_model.is_none());
    assert!(harness.session.runtime().models.is_empty());
    assert_eq!(harness.backend.events(), events_before);
}

#[test]
fn missing_dataset_blocks_initialization() {
    let mut harness = Harness::new(FakeBackend::new(&["a", "b"]));
    harness.session.set_task(Task::Classification).unwrap();

    let (result, _) = harness.initialize();

    assert!(matches!(result, Err(SetupError::MissingElements)));
    assert!(harness.session.is_editable());
    assert!(harness.backend.events().is_empty());
}

#[test]
fn single_random_model_builds_baseline_and_model_1() {
    let mut harness = Harness::ready(FakeBackend::new(&["0", "1"]), &[(SamplingStrategy::Random, 1)]);
    assert_eq!(harness.session.phase(), SetupPhase::Ready);
    assert_eq!(harness.session.config().device, Device::Cpu);
    assert!(harness.session.config().fixed_data_init);

    let (result, updates) = harness.initialize();

    result.unwrap();
    assert!(harness.session.setup_finished());
    assert_eq!(harness.session.phase(), SetupPhase::Finished);
    let runtime = harness.session.runtime();
    assert_eq!(runtime.baseline_accuracy, Some(0.9));
    assert_eq!(
        runtime.model(ModelKey::BASELINE).map(|m| m.model_id().to_string()),
        Some("model_0".to_string())
    );
    assert_eq!(runtime.model_keys().collect::<Vec<_>>(), vec![ModelKey::single(1)]);
    assert_eq!(
        harness.backend.built_ids(),
        vec!["model_0".to_string(), "model_1_random".to_string()]
    );

    let fractions = Harness::fractions(&updates);
    assert_non_decreasing(&fractions);
    assert!(fractions.contains(&0.5));
    assert_eq!(fractions.last().copied(), Some(1.0));
    assert_eq!(updates.last().map(|u| u.stage), Some(InitStage::Finished));
}

#[test]
fn replicated_models_get_dotted_keys() {
    let mut harness = Harness::ready(
        FakeBackend::new(&["0", "1"]),
        &[(SamplingStrategy::Bald, 3), (SamplingStrategy::MaxEntropy, 1)],
    );

    let (result, updates) = harness.initialize();

    result.unwrap();
    let keys: Vec<String> = harness
        .session
        .runtime()
        .model_keys()
        .map(|key| key.to_string())
        .collect();
    assert_eq!(keys, vec!["model_1.0", "model_1.1", "model_1.2", "model_2"]);
    assert_eq!(
        harness.backend.built_ids(),
        vec![
            "model_0",
            "model_1.0_bald",
            "model_1.1_bald",
            "model_1.2_bald",
            "model_2_max_entropy"
        ]
    );
    let replicas: Vec<ModelKey> = harness
        .session
        .runtime()
        .replicas_of(1)
        .map(|(key, _)| key)
        .collect();
    assert_eq!(replicas.len(), 3);
    assert_non_decreasing(&Harness::fractions(&updates));
}

#[test]
fn replica_progress_follows_sub_range_formula() {
    let mut harness = Harness::ready(FakeBackend::new(&["0", "1"]), &[(SamplingStrategy::VarRatio, 2)]);

    let (result, updates) = harness.initialize();

    result.unwrap();
    let expected = [0.0, 0.5, 0.5, 0.625, 0.75, 0.75, 0.875, 1.0, 1.0];
    let fractions = Harness::fractions(&updates);
    assert_eq!(fractions.len(), expected.len(), "{fractions:?}");
    for (actual, expected) in fractions.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-6, "{fractions:?}");
    }
}

#[test]
fn fixed_data_init_clones_the_imported_dataset() {
    let mut harness = Harness::ready(FakeBackend::new(&["0", "1"]), &[(SamplingStrategy::Random, 2)]);

    harness.initialize().0.unwrap();

    assert_eq!(harness.backend.loads(), 1, "only the import loads from disk");
    let runtime = harness.session.runtime();
    let base = runtime
        .dataset
        .as_ref()
        .and_then(|d| d.as_any().downcast_ref::<FakeDataset>())
        .expect("base dataset");
    let mut seen = vec![base.id];
    for (_, model) in runtime.replicas_of(1) {
        let copy = model
            .dataset()
            .as_any()
            .downcast_ref::<FakeDataset>()
            .expect("fake dataset");
        assert!(copy.same_content(base));
        assert!(!seen.contains(&copy.id), "datasets must be independent copies");
        seen.push(copy.id);
    }
}

#[test]
fn unfixed_data_init_reloads_from_configured_paths() {
    let mut harness = Harness::ready(
        FakeBackend::new(&["0", "1"]),
        &[(SamplingStrategy::Random, 2), (SamplingStrategy::Bald, 1)],
    );
    harness.session.set_fixed_data_init(false).unwrap();

    harness.initialize().0.unwrap();

    assert_eq!(harness.backend.loads(), 1 + 3);
    let source = harness.session.config().dataset.clone().expect("source");
    for key in harness.session.runtime().model_keys().collect::<Vec<_>>() {
        let model = harness.session.runtime().model(key).expect("model");
        assert_eq!(model.dataset().source(), &source);
    }
    let clones = harness
        .backend
        .events()
        .iter()
        .filter(|event| matches!(event, Event::Clone { .. }))
        .count();
    assert_eq!(clones, 2, "plan snapshot and baseline only");
}

#[test]
fn finished_setup_rejects_changes() {
    let mut harness = Harness::ready(FakeBackend::new(&["0", "1"]), &[(SamplingStrategy::Random, 1)]);
    harness.initialize().0.unwrap();

    assert!(matches!(harness.session.set_task(Task::ObjectDetection), Err(SetupError::Frozen)));
    assert!(matches!(harness.session.set_model_count(3), Err(SetupError::Frozen)));
    assert!(matches!(harness.session.set_device(Device::Cuda), Err(SetupError::Frozen)));
    assert!(matches!(harness.session.set_fixed_data_init(false), Err(SetupError::Frozen)));
    assert!(matches!(
        harness.session.set_replica_count(1, 2),
        Err(SetupError::Frozen)
    ));
    let (again, updates) = harness.initialize();
    assert!(matches!(again, Err(SetupError::AlreadyFinished)));
    assert!(updates.is_empty());
    assert!(harness.session.setup_finished());
    assert_eq!(harness.session.config().task, Some(Task::Classification));
}

#[test]
fn zero_models_builds_only_the_baseline() {
    let mut harness = Harness::ready(FakeBackend::new(&["0", "1"]), &[]);

    let (result, updates) = harness.initialize();

    result.unwrap();
    assert_eq!(Harness::fractions(&updates), vec![0.0, 0.5, 1.0]);
    assert_eq!(updates.last().map(|u| u.stage.to_string()).as_deref(), Some("setup finished"));
    assert!(harness.session.runtime().models.is_empty());
    assert!(harness.session.runtime().baseline_model.is_some());
    assert!(harness.session.setup_finished());
}

#[test]
fn failed_initialization_commits_nothing_and_stays_frozen() {
    let backend = FakeBackend::new(&["0", "1"]).failing_training("model_2_bald");
    let mut harness = Harness::ready(
        backend,
        &[(SamplingStrategy::Random, 1), (SamplingStrategy::Bald, 1)],
    );

    let (result, _) = harness.initialize();

    match result {
        Err(SetupError::Init(InitError::Backend { key, .. })) => {
            assert_eq!(key, ModelKey::single(2));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(harness.session.phase(), SetupPhase::Failed);
    assert!(harness.session.setup_failed());
    assert!(!harness.session.setup_finished());
    assert!(!harness.session.is_editable());
    assert!(harness.session.runtime().baseline_model.is_none());
    assert!(harness.session.runtime().baseline_accuracy.is_none());
    assert!(harness.session.runtime().models.is_empty());

    assert!(matches!(harness.session.set_model_count(1), Err(SetupError::Frozen)));
    assert!(matches!(
        harness.session.set_task(Task::ObjectDetection),
        Err(SetupError::Frozen)
    ));
    assert!(matches!(
        harness.session.begin_initialization(),
        Err(SetupError::SetupFailed)
    ));
    assert_eq!(harness.session.config().models.len(), 2);
}

#[test]
fn begin_initialization_guards_concurrent_runs() {
    let mut harness = Harness::ready(FakeBackend::new(&["0", "1"]), &[(SamplingStrategy::Random, 1)]);

    let plan = harness.session.begin_initialization().unwrap();
    assert_eq!(harness.session.phase(), SetupPhase::Initializing);
    assert!(matches!(
        harness.session.begin_initialization(),
        Err(SetupError::AlreadyInitializing)
    ));
    assert!(matches!(harness.session.set_task(Task::ObjectDetection), Err(SetupError::Frozen)));

    let outcome = aclearn::setup::run_initialization(plan, &harness.backend, &mut NoProgress);
    harness.session.finish_initialization(outcome).unwrap();
    assert!(matches!(
        harness.session.finish_initialization(Err(InitError::WorkerStopped)),
        Err(SetupError::NotInitializing)
    ));
    assert!(harness.session.setup_finished());
}
