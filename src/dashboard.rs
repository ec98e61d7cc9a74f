//! The fixed set of dashboard sections, each pairing one view builder with
//! the chart that displays it.

use anyhow::Result;

use crate::chart::{Chart, ChartKind, ChartSpec};
use crate::data::derive::DerivedListingTable;
use crate::data::filter::FilterToggles;
use crate::data::model::ListingColumn;
use crate::data::views::{self, AGE_THRESHOLD, HIGH_MILEAGE_THRESHOLD, TOP_N};

/// Dashboard sections in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    PriceVsMileage,
    TopBrandTypes,
    HighMileage,
    PriceByColor,
    YearCondition,
    ColorFrequency,
    RecentMileage,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::PriceVsMileage,
        Section::TopBrandTypes,
        Section::HighMileage,
        Section::PriceByColor,
        Section::YearCondition,
        Section::ColorFrequency,
        Section::RecentMileage,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Section::PriceVsMileage => "Price vs Mileage by Brand",
            Section::TopBrandTypes => "Distribution of Vehicle Types Across Top 10 Brands",
            Section::HighMileage => "High Mileage Vehicles",
            Section::PriceByColor => "Average Price by Vehicle Color",
            Section::YearCondition => "Vehicle Distribution by Condition and Year",
            Section::ColorFrequency => "Number of Vehicles by Color",
            Section::RecentMileage => "Average Mileage for Vehicles < 10 Years Old by Brand",
        }
    }

    /// Label of the checkbox gating this section, if it has one.
    pub fn toggle_label(self) -> Option<&'static str> {
        match self {
            Section::TopBrandTypes => Some("Show Top 10 Brands Only"),
            Section::HighMileage => Some("Show Vehicles with Odometer > 200,000"),
            _ => None,
        }
    }

    pub fn is_enabled(self, toggles: &FilterToggles) -> bool {
        match self {
            Section::TopBrandTypes => toggles.show_top_brands,
            Section::HighMileage => toggles.show_high_mileage,
            _ => true,
        }
    }

    pub fn chart_spec(self) -> ChartSpec {
        match self {
            Section::PriceVsMileage => ChartSpec::new(
                ChartKind::Scatter,
                "Vehicle Price vs. Mileage by Brand",
                "odometer",
                "price",
            )
            .color_by("brand")
            .opacity(0.4),
            Section::TopBrandTypes => ChartSpec::new(
                ChartKind::StackedBar,
                "Distribution of Vehicle Types Across Top 10 Brands",
                "brand",
                "count",
            )
            .labels("Brand", "Number of Vehicles")
            .color_by("type"),
            Section::HighMileage => ChartSpec::new(
                ChartKind::Bar,
                "Most Prevalent Vehicle Types for Mileage > 200,000",
                "vehicle_type",
                "vehicle_count",
            )
            .labels("Vehicle Type", "Number of Vehicles"),
            Section::PriceByColor => ChartSpec::new(
                ChartKind::Bar,
                "Average Price of Vehicles by Color",
                "paint_color",
                "price",
            )
            .labels("Vehicle Color", "Average Price ($)"),
            Section::YearCondition => ChartSpec::new(
                ChartKind::StackedHistogram,
                "Vehicle Distribution by Condition and Year",
                "model_year",
                "count",
            )
            .labels("Model Year", "Count of Vehicles")
            .color_by("condition")
            .opacity(0.7),
            Section::ColorFrequency => ChartSpec::new(
                ChartKind::Bar,
                "Number of Vehicles by Color",
                "paint_color",
                "vehicle_count",
            )
            .labels("Vehicle Color", "Number of Vehicles"),
            Section::RecentMileage => ChartSpec::new(
                ChartKind::BarWithErrors,
                "Average Mileage for Vehicles < 10 Years Old by Brand",
                "brand",
                "avg_mileage",
            )
            .labels("Brand", "Average Mileage (miles)")
            .error_by("std_mileage")
            .hover("vehicle_count"),
        }
    }
}

/// Run the section's view builder and hand the view to the chart adapter.
pub fn build(section: Section, table: &DerivedListingTable) -> Result<Chart> {
    let view = match section {
        Section::PriceVsMileage => views::scatter_view(table)?,
        Section::TopBrandTypes => views::top_brands_type_view(table, TOP_N)?,
        Section::HighMileage => views::high_mileage_type_view(table, HIGH_MILEAGE_THRESHOLD)?,
        Section::PriceByColor => {
            views::mean_by_category_view(table, ListingColumn::PaintColor, ListingColumn::Price)?
        }
        Section::YearCondition => views::reshaped_year_condition_view(table)?,
        Section::ColorFrequency => views::count_by_category_view(table, ListingColumn::PaintColor)?,
        Section::RecentMileage => views::dispersion_by_brand_view(table, AGE_THRESHOLD)?,
    };
    log::debug!(
        "{section:?}: {:?} view with {} rows of {:?}",
        view.kind(),
        view.len(),
        view.columns()
    );
    Ok(Chart::from_view(view, section.chart_spec())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::tests::{listing, table};

    #[test]
    fn every_section_builds_on_a_complete_table() {
        let t = table(vec![
            listing("ford f150", Some(2015), Some(250000.0), Some(20000.0), "truck", "good", Some("red")),
            listing("ford focus", Some(2010), Some(120000.0), Some(8000.0), "sedan", "fair", Some("blue")),
            listing("honda civic", Some(2012), Some(90000.0), Some(7000.0), "sedan", "good", None),
        ]);
        for section in Section::ALL {
            let chart = build(section, &t).unwrap();
            assert_eq!(chart.spec, section.chart_spec());
            assert!(!chart.is_empty(), "{section:?} produced no points");
        }
    }

    #[test]
    fn toggled_sections_follow_their_checkbox() {
        let toggles = FilterToggles {
            show_top_brands: true,
            show_high_mileage: false,
        };
        assert!(Section::TopBrandTypes.is_enabled(&toggles));
        assert!(!Section::HighMileage.is_enabled(&toggles));
        assert!(Section::PriceByColor.is_enabled(&FilterToggles::default()));
        let gated: Vec<_> = Section::ALL
            .into_iter()
            .filter(|s| s.toggle_label().is_some())
            .collect();
        assert_eq!(gated, vec![Section::TopBrandTypes, Section::HighMileage]);
    }
}
