use std::collections::BTreeSet;

use super::error::{FieldError, SchemaError};
use super::model::{CellValue, Listing, ListingColumn, RawListingTable};

/// Year the listings were scraped; vehicle age is measured against it.
pub const REFERENCE_YEAR: i32 = 2019;

// ---------------------------------------------------------------------------
// Field derivation
// ---------------------------------------------------------------------------

/// Brand is the first whitespace-delimited token of the free-text model.
pub fn brand_of(model: Option<&str>) -> Result<&str, FieldError> {
    model
        .and_then(|m| m.split_whitespace().next())
        .ok_or(FieldError::MissingField(ListingColumn::Model))
}

/// Age relative to [`REFERENCE_YEAR`]; negative for model years after it.
pub fn vehicle_age_of(model_year: Option<i32>) -> Option<i32> {
    model_year.and_then(|year| REFERENCE_YEAR.checked_sub(year))
}

/// A listing together with the fields computed from it.
///
/// The source listing is held privately and never handed out mutably, so
/// `brand` and `vehicle_age` always agree with `model` and `model_year`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedListing {
    listing: Listing,
    brand: Option<String>,
    vehicle_age: Option<i32>,
}

impl DerivedListing {
    pub fn new(listing: Listing) -> Self {
        let brand = brand_of(listing.model.as_deref()).ok().map(str::to_string);
        let vehicle_age = vehicle_age_of(listing.model_year);
        DerivedListing {
            listing,
            brand,
            vehicle_age,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn vehicle_age(&self) -> Option<i32> {
        self.vehicle_age
    }

    /// Value of any column, raw or derived.
    pub fn value(&self, column: ListingColumn) -> CellValue {
        match column {
            ListingColumn::Brand => self.brand().into(),
            ListingColumn::VehicleAge => self.vehicle_age.into(),
            raw => self.listing.value(raw),
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedListingTable
// ---------------------------------------------------------------------------

/// The raw table plus `brand` and `vehicle_age`. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct DerivedListingTable {
    columns: BTreeSet<ListingColumn>,
    rows: Vec<DerivedListing>,
}

impl DerivedListingTable {
    pub fn rows(&self) -> &[DerivedListing] {
        &self.rows
    }

    /// Fail unless every column in `required` is declared by the table.
    pub fn require(&self, required: &[ListingColumn]) -> Result<(), SchemaError> {
        match required.iter().find(|col| !self.columns.contains(col)) {
            Some(&missing) => Err(SchemaError::MissingColumn(missing)),
            None => Ok(()),
        }
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compute `brand` and `vehicle_age` for every listing.
///
/// A listing without a usable model keeps an undefined brand and simply
/// drops out of brand-keyed views; the table is never rejected for it.
pub fn derive(raw: RawListingTable) -> DerivedListingTable {
    let (mut columns, listings) = raw.into_parts();
    if columns.contains(&ListingColumn::Model) {
        columns.insert(ListingColumn::Brand);
    }
    if columns.contains(&ListingColumn::ModelYear) {
        columns.insert(ListingColumn::VehicleAge);
    }

    let rows: Vec<DerivedListing> = listings.into_iter().map(DerivedListing::new).collect();

    let without_brand = rows.iter().filter(|row| row.brand.is_none()).count();
    if without_brand > 0 {
        log::warn!("{without_brand} listings have no model; excluded from brand views");
    }
    log::debug!("Derived brand and vehicle_age for {} listings", rows.len());

    DerivedListingTable { columns, rows }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Shorthand for building listings in tests across the data layer.
    pub(crate) fn listing(
        model: &str,
        model_year: Option<i32>,
        odometer: Option<f64>,
        price: Option<f64>,
        vehicle_type: &str,
        condition: &str,
        paint_color: Option<&str>,
    ) -> Listing {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Listing {
            model: text(model),
            model_year,
            price,
            odometer,
            paint_color: paint_color.map(str::to_string),
            vehicle_type: text(vehicle_type),
            condition: text(condition),
        }
    }

    pub(crate) fn table(rows: Vec<Listing>) -> DerivedListingTable {
        derive(RawListingTable::new(rows))
    }

    #[test]
    fn derives_brand_and_age_for_example_rows() {
        let derived = table(vec![
            listing("Ford F150", Some(2015), Some(50000.0), Some(20000.0), "truck", "good", Some("red")),
            listing("Ford Focus", Some(2010), Some(120000.0), Some(8000.0), "sedan", "fair", Some("blue")),
        ]);
        let brands: Vec<_> = derived.rows().iter().map(|r| r.brand()).collect();
        let ages: Vec<_> = derived.rows().iter().map(|r| r.vehicle_age()).collect();
        assert_eq!(brands, vec![Some("Ford"), Some("Ford")]);
        assert_eq!(ages, vec![Some(4), Some(9)]);
    }

    #[test]
    fn missing_model_is_an_undefined_brand_not_a_failure() {
        assert_eq!(
            brand_of(Some("   ")),
            Err(FieldError::MissingField(ListingColumn::Model))
        );
        assert_eq!(brand_of(None), Err(FieldError::MissingField(ListingColumn::Model)));

        let derived = table(vec![listing("", Some(2012), None, None, "suv", "good", None)]);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived.rows()[0].brand(), None);
        assert_eq!(derived.rows()[0].value(ListingColumn::Brand), CellValue::Null);
        assert_eq!(derived.rows()[0].vehicle_age(), Some(7));
    }

    #[test]
    fn missing_year_leaves_age_undefined() {
        assert_eq!(vehicle_age_of(None), None);
        assert_eq!(vehicle_age_of(Some(2021)), Some(-2));
        assert_eq!(vehicle_age_of(Some(i32::MIN)), None);
    }

    #[test]
    fn derived_schema_follows_declared_sources() {
        let raw = RawListingTable::with_columns(
            [ListingColumn::Model, ListingColumn::Odometer],
            Vec::new(),
        );
        let derived = derive(raw);
        assert!(derived.require(&[ListingColumn::Brand]).is_ok());
        assert_eq!(
            derived.require(&[ListingColumn::Brand, ListingColumn::VehicleAge]),
            Err(SchemaError::MissingColumn(ListingColumn::VehicleAge))
        );
    }

    proptest! {
        #[test]
        fn brand_is_first_token(words in proptest::collection::vec("[A-Za-z0-9-]{1,8}", 1..5), pad in " {0,3}") {
            let model = format!("{pad}{}", words.join(" "));
            let row = DerivedListing::new(Listing { model: Some(model.clone()), ..Listing::default() });
            prop_assert_eq!(row.brand(), model.split_whitespace().next());
            prop_assert_eq!(row.brand(), Some(words[0].as_str()));
            prop_assert_eq!(DerivedListing::new(row.listing().clone()), row);
        }

        #[test]
        fn age_is_reference_year_minus_model_year(year in 1900i32..2100) {
            let row = DerivedListing::new(Listing { model_year: Some(year), ..Listing::default() });
            prop_assert_eq!(row.vehicle_age(), Some(2019 - year));
        }
    }
}
