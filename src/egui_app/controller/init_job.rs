use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use super::*;
use crate::egui_app::state::ProgressOverlayState;
use crate::setup::{InitError, InitOutcome, InitPlan, ProgressUpdate, run_initialization};

/// Messages sent from the initialization worker to the UI thread.
#[derive(Debug)]
pub enum InitMessage {
    Progress(ProgressUpdate),
    Finished(Result<InitOutcome, InitError>),
}

pub(super) struct InitJob {
    rx: Receiver<InitMessage>,
    handle: Option<JoinHandle<()>>,
}

impl InitJob {
    fn spawn(plan: InitPlan, backend: Arc<dyn Backend>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("aclearn-init".into())
            .spawn(move || run_worker(plan, backend.as_ref(), tx))?;
        Ok(Self {
            rx,
            handle: Some(handle),
        })
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("initialization worker panicked");
            }
        }
    }
}

fn run_worker(plan: InitPlan, backend: &dyn Backend, tx: Sender<InitMessage>) {
    let progress_tx = tx.clone();
    let mut sink = move |update: ProgressUpdate| {
        let _ = progress_tx.send(InitMessage::Progress(update));
    };
    let result = run_initialization(plan, backend, &mut sink);
    let _ = tx.send(InitMessage::Finished(result));
}

impl EguiController {
    /// "validate setup": freeze the configuration and start the worker.
    pub fn start_initialization(&mut self) {
        let plan = match self.session.begin_initialization() {
            Ok(plan) => plan,
            Err(err) => {
                self.set_status(err.to_string(), StatusTone::Error);
                return;
            }
        };
        match InitJob::spawn(plan, Arc::clone(&self.backend)) {
            Ok(job) => {
                self.init_job = Some(job);
                self.ui.progress = ProgressOverlayState::new("Initializing models");
                self.set_status("initializing models...", StatusTone::Busy);
            }
            Err(err) => self.abort_start(err),
        }
    }

    /// The session is already frozen when spawning fails, so this goes through
    /// the regular failure path.
    fn abort_start(&mut self, err: std::io::Error) {
        error!("Failed to spawn initialization worker: {err}");
        self.complete_initialization(Err(InitError::Spawn(err)));
    }

    /// Drain worker messages; call once per frame.
    ///
    /// Returns true when something changed and the UI should repaint.
    pub fn poll_initialization(&mut self) -> bool {
        let mut changed = false;
        loop {
            let Some(job) = self.init_job.as_ref() else {
                return changed;
            };
            match job.rx.try_recv() {
                Ok(InitMessage::Progress(update)) => {
                    self.ui.progress.advance(update.fraction, update.stage.to_string());
                    changed = true;
                }
                Ok(InitMessage::Finished(result)) => {
                    self.complete_initialization(result);
                    return true;
                }
                Err(TryRecvError::Empty) => return changed,
                Err(TryRecvError::Disconnected) => {
                    self.complete_initialization(Err(InitError::WorkerStopped));
                    return true;
                }
            }
        }
    }

    fn complete_initialization(&mut self, result: Result<InitOutcome, InitError>) {
        if let Some(mut job) = self.init_job.take() {
            job.join();
        }
        self.ui.progress.reset();
        match self.session.finish_initialization(result) {
            Ok(()) => {
                info!(session = %self.session.id(), "setup finished");
                self.ui.dataset.editing = false;
                self.ui.task.editing = false;
                self.ui.models.editing = false;
                self.set_status("setup finished", StatusTone::Info);
            }
            Err(err) => {
                error!("Initialization failed: {err}");
                self.set_status(format!("Initialization failed: {err}"), StatusTone::Error);
            }
        }
    }

    /// Start the worker and block until it reports a result.
    pub fn initialize_blocking(&mut self) {
        self.start_initialization();
        while let Some(job) = self.init_job.as_ref() {
            let message = job.rx.recv();
            match message {
                Ok(InitMessage::Progress(update)) => {
                    self.ui.progress.advance(update.fraction, update.stage.to_string());
                }
                Ok(InitMessage::Finished(result)) => self.complete_initialization(result),
                Err(_) => self.complete_initialization(Err(InitError::WorkerStopped)),
            }
        }
    }
}
