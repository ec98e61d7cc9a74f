mod app;
mod chart;
mod color;
mod config;
mod dashboard;
mod data;
mod state;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use app::VehicleDashApp;
use config::AppConfig;
use eframe::egui;
use state::{AppState, DashboardEvent};

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::from_env_and_args(std::env::args().skip(1))?;
    let mut state = AppState::with_toggles(config.toggles());

    if let Some(path) = config.startup_dataset(Path::new(".")) {
        let raw = data::loader::load_file(&path)
            .context("the dashboard cannot start without its dataset")?;
        state.handle(DashboardEvent::DatasetLoaded(data::derive::derive(raw)));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vehicle Advertisement Data Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(VehicleDashApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
