use eframe::egui::{self, Color32, RichText, Ui};

use crate::dashboard::Section;
use crate::data::{derive, loader};
use crate::state::{AppState, DashboardEvent};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let mut top_brands = state.toggles.show_top_brands;
    if ui
        .checkbox(&mut top_brands, toggle_label(Section::TopBrandTypes))
        .changed()
    {
        state.handle(DashboardEvent::TopBrandsToggled(top_brands));
    }

    let mut high_mileage = state.toggles.show_high_mileage;
    if ui
        .checkbox(&mut high_mileage, toggle_label(Section::HighMileage))
        .changed()
    {
        state.handle(DashboardEvent::HighMileageToggled(high_mileage));
    }
}

fn toggle_label(section: Section) -> &'static str {
    section.toggle_label().unwrap_or_else(|| section.header())
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} listings loaded, {} charts shown",
                ds.len(),
                state.charts.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle listings")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_file(&path) {
            Ok(raw) => {
                state.handle(DashboardEvent::DatasetLoaded(derive::derive(raw)));
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
