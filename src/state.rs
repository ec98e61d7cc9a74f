use std::collections::BTreeMap;

use crate::chart::Chart;
use crate::dashboard::{self, Section};
use crate::data::derive::DerivedListingTable;
use crate::data::filter::FilterToggles;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Everything the UI can ask the dashboard to do.
#[derive(Debug)]
pub enum DashboardEvent {
    DatasetLoaded(DerivedListingTable),
    TopBrandsToggled(bool),
    HighMileageToggled(bool),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded listings (None until a dataset is loaded). Never mutated in place.
    pub dataset: Option<DerivedListingTable>,

    /// Checkbox state of the filter panel.
    pub toggles: FilterToggles,

    /// Rendered chart per visible section.
    pub charts: BTreeMap<Section, Chart>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn with_toggles(toggles: FilterToggles) -> Self {
        Self {
            toggles,
            ..Self::default()
        }
    }

    /// Apply one event, rebuilding only the sections it affects.
    pub fn handle(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::DatasetLoaded(table) => {
                self.status_message = table
                    .is_empty()
                    .then(|| "The dataset holds no listings.".to_string());
                self.dataset = Some(table);
                self.charts.clear();
                for section in Section::ALL {
                    self.rebuild(section);
                }
            }
            DashboardEvent::TopBrandsToggled(on) => {
                self.toggles.show_top_brands = on;
                self.rebuild(Section::TopBrandTypes);
            }
            DashboardEvent::HighMileageToggled(on) => {
                self.toggles.show_high_mileage = on;
                self.rebuild(Section::HighMileage);
            }
        }
    }

    /// Re-run one section's pipeline, or drop its chart when it is hidden.
    fn rebuild(&mut self, section: Section) {
        let Some(table) = &self.dataset else {
            return;
        };
        if !section.is_enabled(&self.toggles) {
            self.charts.remove(&section);
            return;
        }
        match dashboard::build(section, table) {
            Ok(chart) => {
                self.charts.insert(section, chart);
            }
            Err(e) => {
                log::error!("Failed to build '{}': {e:#}", section.header());
                self.status_message = Some(format!("Error: {e:#}"));
                self.charts.remove(&section);
            }
        }
    }

    pub fn chart(&self, section: Section) -> Option<&Chart> {
        self.charts.get(&section)
    }
}
