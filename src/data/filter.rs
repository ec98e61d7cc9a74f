use std::collections::HashMap;

use super::derive::DerivedListingTable;

// ---------------------------------------------------------------------------
// User toggles
// ---------------------------------------------------------------------------

/// The two checkboxes of the filter panel. A section whose toggle is off
/// is hidden and its view is not built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterToggles {
    pub show_top_brands: bool,
    pub show_high_mileage: bool,
}

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// The `top_n` most frequent brands, most frequent first.
///
/// Brands with equal counts keep their first-encountered relative order.
/// Fewer than `top_n` distinct brands yields all of them.
pub fn top_brands(table: &DerivedListingTable, top_n: usize) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for brand in table.rows().iter().filter_map(|row| row.brand()) {
        let count = counts.entry(brand).or_insert_with(|| {
            order.push(brand);
            0
        });
        *count += 1;
    }

    // `sort_by` is stable, so ties stay in encounter order.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.into_iter().take(top_n).map(str::to_string).collect()
}

/// Indices of rows whose brand is one of `brands`.
pub fn rows_with_brand_in(table: &DerivedListingTable, brands: &[String]) -> Vec<usize> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.brand()
                .is_some_and(|brand| brands.iter().any(|b| b == brand))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Indices of rows whose odometer reads strictly more than `threshold`.
pub fn rows_above_odometer(table: &DerivedListingTable, threshold: f64) -> Vec<usize> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.listing().odometer.is_some_and(|o| o > threshold))
        .map(|(i, _)| i)
        .collect()
}

/// Indices of rows strictly younger than `age_threshold` years.
/// Rows with an undefined age never pass.
pub fn rows_younger_than(table: &DerivedListingTable, age_threshold: i32) -> Vec<usize> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.vehicle_age().is_some_and(|age| age < age_threshold))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::tests::{listing, table};

    fn by_model(models: &[&str]) -> DerivedListingTable {
        table(
            models
                .iter()
                .map(|m| listing(m, Some(2015), None, None, "sedan", "good", None))
                .collect(),
        )
    }

    #[test]
    fn top_brands_ranks_by_frequency_with_stable_ties() {
        let t = by_model(&[
            "honda civic",
            "ford focus",
            "toyota camry",
            "ford f-150",
            "toyota rav4",
            "bmw x5",
        ]);
        assert_eq!(top_brands(&t, 3), vec!["ford", "toyota", "honda"]);
        assert_eq!(top_brands(&t, 10), vec!["ford", "toyota", "honda", "bmw"]);
        assert!(top_brands(&t, 0).is_empty());
    }

    #[test]
    fn brand_membership_skips_undefined_brands() {
        let t = by_model(&["ford focus", "", "honda civic", "ford ranger"]);
        assert_eq!(rows_with_brand_in(&t, &["ford".to_string()]), vec![0, 3]);
    }

    #[test]
    fn odometer_threshold_is_strict() {
        let t = table(vec![
            listing("ford focus", Some(2010), Some(200000.0), None, "sedan", "fair", None),
            listing("ford focus", Some(2010), Some(200001.0), None, "sedan", "fair", None),
            listing("ford focus", Some(2010), None, None, "sedan", "fair", None),
        ]);
        assert_eq!(rows_above_odometer(&t, 200000.0), vec![1]);
    }

    #[test]
    fn age_threshold_excludes_undefined_ages() {
        let t = table(vec![
            listing("ford focus", Some(2009), None, None, "sedan", "fair", None),
            listing("ford focus", Some(2010), None, None, "sedan", "fair", None),
            listing("ford focus", None, None, None, "sedan", "fair", None),
            listing("ford focus", Some(2020), None, None, "sedan", "fair", None),
        ]);
        assert_eq!(rows_younger_than(&t, 10), vec![1, 3]);
    }
}
