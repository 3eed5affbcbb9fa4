//! Shared state types for the egui UI.

mod progress;
mod setup;
mod status;

pub use progress::*;
pub use setup::*;
pub use status::*;

use crate::settings::Theme;

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub theme: Theme,
    pub status: StatusBarState,
    pub progress: ProgressOverlayState,
    pub dataset: DatasetFormState,
    pub task: TaskFormState,
    pub models: ModelsFormState,
}
