#![deny(missing_docs)]

//! Entry point for the aclearn setup window.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]
use std::sync::Arc;

use aclearn::backend::BuiltinBackend;
use aclearn::egui_app::ui::EguiApp;
use aclearn::{logging, settings};
use eframe::egui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let loaded = settings::load_or_default();
    if let Err(err) = &loaded {
        tracing::error!("Failed to load settings: {err}");
    }

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([760.0, 820.0])
        .with_min_inner_size([520.0, 480.0]);
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "aclearn",
        native_options,
        Box::new(move |_cc| match loaded {
            Ok(settings) => {
                let backend = Arc::new(BuiltinBackend::new(
                    settings.learner.clone(),
                    settings.seed,
                ));
                Ok(Box::new(EguiApp::new(settings, backend)))
            }
            Err(err) => Ok(Box::new(LaunchError {
                message: format!("Failed to load settings: {err}"),
            })),
        }),
    )?;
    Ok(())
}

/// Minimal fallback app to display initialization errors.
struct LaunchError {
    message: String,
}

impl eframe::App for LaunchError {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Failed to start UI");
                ui.label(&self.message);
            });
        });
    }
}
