//! Bridges the setup workflow to the egui UI.

mod dataset_import;
mod init_job;
mod model_form;

use std::sync::Arc;

use tracing::info;

use crate::backend::Backend;
use crate::egui_app::state::UiState;
use crate::egui_app::ui::style::StatusTone;
use crate::session::{Session, SetupPhase};
use crate::settings::AppSettings;

pub use init_job::InitMessage;
use init_job::InitJob;

/// Maintains app state and bridges core logic to the egui UI.
pub struct EguiController {
    pub ui: UiState,
    session: Session,
    settings: AppSettings,
    backend: Arc<dyn Backend>,
    init_job: Option<InitJob>,
}

impl EguiController {
    pub fn new(settings: AppSettings, backend: Arc<dyn Backend>) -> Self {
        let mut ui = UiState {
            theme: settings.theme,
            ..UiState::default()
        };
        ui.models.device = backend.devices().first().copied().unwrap_or_default();
        Self {
            ui,
            session: Session::new(settings.limits()),
            settings,
            backend,
            init_job: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn phase(&self) -> SetupPhase {
        self.session.phase()
    }

    /// True while a worker thread is running the initialization.
    pub fn init_in_progress(&self) -> bool {
        self.init_job.is_some()
    }

    /// Replace a failed session with a fresh one; the old session is dropped.
    pub fn new_session(&mut self) {
        if self.init_in_progress() {
            return;
        }
        let previous = self.session.id();
        self.session = Session::new(self.settings.limits());
        self.ui = UiState {
            theme: self.ui.theme,
            status: std::mem::take(&mut self.ui.status),
            ..UiState::default()
        };
        self.ui.models.device = self.backend.devices().first().copied().unwrap_or_default();
        info!(%previous, session = %self.session.id(), "new session");
        self.set_status("new session started", StatusTone::Idle);
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.ui.status.set(text, tone);
    }
}
