//! egui front-end for the experiment setup window.

pub mod controller;
pub mod state;
pub mod ui;
