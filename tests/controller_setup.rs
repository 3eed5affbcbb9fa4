mod support;

use std::path::Path;
use std::sync::Arc;

use aclearn::backend::BuiltinBackend;
use aclearn::egui_app::controller::EguiController;
use aclearn::egui_app::state::{DatasetFile, ModelDraft};
use aclearn::session::{Device, ModelKey, SamplingStrategy, SetupPhase, Task};
use aclearn::settings::{AppSettings, LearnerSettings};
use support::npy::write_blobs;
use tempfile::tempdir;

fn controller(data_dir: &Path) -> EguiController {
    let settings = AppSettings {
        data_dir: data_dir.to_path_buf(),
        size_init_per_class: 3,
        seed: Some(11),
        learner: LearnerSettings {
            hidden_size: 8,
            epochs: 15,
            mc_passes: 2,
            ..LearnerSettings::default()
        },
        ..AppSettings::default()
    };
    let backend = Arc::new(BuiltinBackend::new(settings.learner.clone(), settings.seed));
    EguiController::new(settings, backend)
}

fn import_blobs(controller: &mut EguiController, picks: &Path) {
    let (data, labels) = write_blobs(picks, 48, 2);
    controller.load_dataset_file(DatasetFile::Data, data);
    controller.load_dataset_file(DatasetFile::Labels, labels);
    controller.validate_import();
}

#[test]
fn full_setup_reaches_finished() {
    let picks = tempdir().unwrap();
    let store = tempdir().unwrap();
    let mut controller = controller(&store.path().join("data"));

    import_blobs(&mut controller, picks.path());
    assert_eq!(controller.ui.status.text, "data & labels imported (2 classes)");
    assert!(store.path().join("data").join("x_train.npy").is_file());
    assert_eq!(controller.session().labels(), ["0", "1"]);

    controller.apply_task(Task::Classification);
    assert_eq!(controller.phase(), SetupPhase::Ready);

    controller.ui.models.drafts = vec![
        ModelDraft {
            strategy: SamplingStrategy::Random,
            replicas: 1,
        },
        ModelDraft {
            strategy: SamplingStrategy::Bald,
            replicas: 2,
        },
    ];
    controller.apply_models();
    assert_eq!(controller.session().config().models.len(), 2);
    assert_eq!(controller.session().config().device, Device::Cpu);

    controller.initialize_blocking();

    assert!(!controller.init_in_progress());
    assert_eq!(controller.phase(), SetupPhase::Finished);
    assert_eq!(controller.ui.status.text, "setup finished");
    assert!(!controller.ui.progress.visible);
    let runtime = controller.session().runtime();
    let accuracy = runtime.baseline_accuracy.expect("baseline accuracy");
    assert!((0.0..=1.0).contains(&accuracy));
    let keys: Vec<ModelKey> = runtime.model_keys().collect();
    assert_eq!(
        keys,
        vec![
            ModelKey::single(1),
            ModelKey::replica(2, 0),
            ModelKey::replica(2, 1)
        ]
    );
    for key in keys {
        let model = runtime.model(key).expect("model");
        assert!(model.accuracy().is_some(), "{key} was not trained");
        assert_eq!(model.dataset().labeled_len(), 6);
    }
}

#[test]
fn controller_refuses_edits_after_setup() {
    let picks = tempdir().unwrap();
    let store = tempdir().unwrap();
    let mut controller = controller(store.path());
    import_blobs(&mut controller, picks.path());
    controller.apply_task(Task::Classification);
    controller.initialize_blocking();
    assert_eq!(controller.phase(), SetupPhase::Finished);

    controller.apply_task(Task::ObjectDetection);

    assert_eq!(controller.session().config().task, Some(Task::Classification));
    assert_eq!(
        controller.ui.status.text,
        "setup is frozen once initialization has started"
    );
}

#[test]
fn cuda_request_fails_and_keeps_configuration_frozen() {
    let picks = tempdir().unwrap();
    let store = tempdir().unwrap();
    let mut controller = controller(store.path());
    import_blobs(&mut controller, picks.path());
    controller.apply_task(Task::Classification);
    controller.ui.models.device = Device::Cuda;
    controller.ui.models.drafts = vec![ModelDraft {
        strategy: SamplingStrategy::MaxEntropy,
        replicas: 1,
    }];
    controller.apply_models();

    controller.initialize_blocking();

    assert_eq!(controller.phase(), SetupPhase::Failed);
    assert!(
        controller.ui.status.text.starts_with("Initialization failed"),
        "{}",
        controller.ui.status.text
    );
    assert!(controller.session().runtime().models.is_empty());
    assert!(controller.session().runtime().baseline_model.is_none());

    controller.ui.models.device = Device::Cpu;
    controller.apply_models();
    assert_eq!(controller.session().config().device, Device::Cuda);
    controller.start_initialization();
    assert_eq!(controller.phase(), SetupPhase::Failed);
    assert!(!controller.init_in_progress());

    controller.new_session();
    assert_eq!(controller.phase(), SetupPhase::Configuring);
    assert!(controller.session().config().task.is_none());
    assert!(controller.session().config().models.is_empty());
}

#[test]
fn validate_without_files_reports_missing_data() {
    let store = tempdir().unwrap();
    let mut controller = controller(store.path());

    controller.validate_import();

    assert_eq!(controller.ui.status.text, "missing data");
    assert!(controller.session().config().dataset.is_none());
}

#[test]
fn setup_without_task_reports_missing_elements() {
    let picks = tempdir().unwrap();
    let store = tempdir().unwrap();
    let mut controller = controller(store.path());
    import_blobs(&mut controller, picks.path());

    controller.initialize_blocking();

    assert_eq!(controller.ui.status.text, "missing some elements");
    assert_eq!(controller.phase(), SetupPhase::Configuring);
}

#[test]
fn zero_replica_draft_is_rejected() {
    let store = tempdir().unwrap();
    let mut controller = controller(store.path());
    controller.ui.models.drafts = vec![ModelDraft {
        strategy: SamplingStrategy::Random,
        replicas: 0,
    }];

    controller.apply_models();

    assert_eq!(controller.ui.status.text, "a model needs at least one sample");
    assert!(controller.session().config().models.is_empty());
    assert!(controller.ui.models.drafts.is_empty());
}
