//! Library exports for the aclearn setup window and its tests.
/// Per-user application directory resolution.
pub mod app_dirs;
/// Dataset and model backend seam plus the built-in CPU backend.
pub mod backend;
/// egui front-end.
pub mod egui_app;
/// Help texts for algorithm and sampling strategy choices.
pub mod explanations;
/// Logging setup.
pub mod logging;
/// Session context: configuration, runtime state and setup phase.
pub mod session;
/// Persistent settings.
pub mod settings;
/// Dataset import and the initialization routine.
pub mod setup;
/// Copying picked files into the data directory.
pub mod uploads;
