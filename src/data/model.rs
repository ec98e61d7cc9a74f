use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::SchemaError;

// ---------------------------------------------------------------------------
// ListingColumn – the statically declared schema
// ---------------------------------------------------------------------------

/// Every column the dashboard knows about, raw and derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListingColumn {
    Model,
    ModelYear,
    Price,
    Odometer,
    PaintColor,
    Type,
    Condition,
    Brand,
    VehicleAge,
}

impl ListingColumn {
    /// Columns a source file must provide.
    pub const RAW: [ListingColumn; 7] = [
        ListingColumn::Model,
        ListingColumn::ModelYear,
        ListingColumn::Price,
        ListingColumn::Odometer,
        ListingColumn::PaintColor,
        ListingColumn::Type,
        ListingColumn::Condition,
    ];

    /// Column name as it appears in source files and aggregate views.
    pub fn name(self) -> &'static str {
        match self {
            ListingColumn::Model => "model",
            ListingColumn::ModelYear => "model_year",
            ListingColumn::Price => "price",
            ListingColumn::Odometer => "odometer",
            ListingColumn::PaintColor => "paint_color",
            ListingColumn::Type => "type",
            ListingColumn::Condition => "condition",
            ListingColumn::Brand => "brand",
            ListingColumn::VehicleAge => "vehicle_age",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ListingColumn::ModelYear
                | ListingColumn::Price
                | ListingColumn::Odometer
                | ListingColumn::VehicleAge
        )
    }
}

impl fmt::Display for ListingColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ListingColumn {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [ListingColumn::Brand, ListingColumn::VehicleAge]
            .into_iter()
            .chain(ListingColumn::RAW)
            .find(|col| col.name() == s)
            .ok_or_else(|| SchemaError::UnknownColumn(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of a listing or aggregate table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, used both as a grouping key and as an
/// aggregate-view value. Must be `Ord`/`Hash` so it can key maps and sets.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(CellValue::Null, |s| CellValue::Text(s.to_string()))
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Null, CellValue::Float)
    }
}

impl From<Option<i32>> for CellValue {
    fn from(value: Option<i32>) -> Self {
        value.map_or(CellValue::Null, |v| CellValue::Integer(i64::from(v)))
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for plotting and averaging.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Listing – one row of the source table
// ---------------------------------------------------------------------------

/// One vehicle-for-sale record. Every field is nullable because the
/// source data has gaps in all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Listing {
    pub model: Option<String>,
    /// Accepts `2011` as well as `2011.0`, which is how float-typed exports write it.
    #[serde(deserialize_with = "lenient_year")]
    pub model_year: Option<i32>,
    #[serde(deserialize_with = "finite_number")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "finite_number")]
    pub odometer: Option<f64>,
    pub paint_color: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub condition: Option<String>,
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let year: Option<f64> = Option::deserialize(deserializer)?;
    Ok(year.and_then(whole_year))
}

/// `NaN` and infinities are how float exports spell a missing number.
fn finite_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()))
}

/// A model year read from a float column. `NaN` is a missing year; a
/// fractional or out-of-range value is rejected with a warning.
pub fn whole_year(year: f64) -> Option<i32> {
    if year.is_nan() {
        return None;
    }
    if year.fract() != 0.0 || year < f64::from(i32::MIN) || year > f64::from(i32::MAX) {
        log::warn!("Ignoring model_year {year}: not a whole year");
        return None;
    }
    Some(year as i32)
}

impl Listing {
    /// Value of a raw column. Derived columns are not stored here.
    pub fn value(&self, column: ListingColumn) -> CellValue {
        match column {
            ListingColumn::Model => self.model.as_deref().into(),
            ListingColumn::ModelYear => self.model_year.into(),
            ListingColumn::Price => self.price.into(),
            ListingColumn::Odometer => self.odometer.into(),
            ListingColumn::PaintColor => self.paint_color.as_deref().into(),
            ListingColumn::Type => self.vehicle_type.as_deref().into(),
            ListingColumn::Condition => self.condition.as_deref().into(),
            ListingColumn::Brand | ListingColumn::VehicleAge => CellValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// RawListingTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded listings together with the columns the source declared.
#[derive(Debug, Clone, Default)]
pub struct RawListingTable {
    columns: BTreeSet<ListingColumn>,
    rows: Vec<Listing>,
}

impl RawListingTable {
    /// A table whose source declared every raw column.
    #[cfg(test)]
    pub fn new(rows: Vec<Listing>) -> Self {
        Self::with_columns(ListingColumn::RAW, rows)
    }

    /// A table whose source declared only `columns`.
    pub fn with_columns(
        columns: impl IntoIterator<Item = ListingColumn>,
        rows: Vec<Listing>,
    ) -> Self {
        RawListingTable {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Fail with the first raw column the source did not declare.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match ListingColumn::RAW
            .into_iter()
            .find(|col| !self.columns.contains(col))
        {
            Some(missing) => Err(SchemaError::MissingColumn(missing)),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    /// Split into parts; used by the field deriver, which consumes the table.
    pub fn into_parts(self) -> (BTreeSet<ListingColumn>, Vec<Listing>) {
        (self.columns, self.rows)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_parse_back() {
        for col in ListingColumn::RAW {
            assert_eq!(col.name().parse::<ListingColumn>(), Ok(col));
        }
        assert_eq!("brand".parse::<ListingColumn>(), Ok(ListingColumn::Brand));
        assert_eq!(
            "colour".parse::<ListingColumn>(),
            Err(SchemaError::UnknownColumn("colour".to_string()))
        );
    }

    #[test]
    fn cell_values_order_null_first() {
        let mut values = vec![
            CellValue::Text("red".into()),
            CellValue::Integer(3),
            CellValue::Null,
            CellValue::Integer(1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                CellValue::Null,
                CellValue::Integer(1),
                CellValue::Integer(3),
                CellValue::Text("red".into()),
            ]
        );
    }

    #[test]
    fn validate_reports_first_missing_column() {
        let table = RawListingTable::with_columns(
            [ListingColumn::Model, ListingColumn::ModelYear, ListingColumn::Price],
            Vec::new(),
        );
        assert_eq!(
            table.validate(),
            Err(SchemaError::MissingColumn(ListingColumn::Odometer))
        );
        assert!(RawListingTable::new(Vec::new()).validate().is_ok());
    }

    #[test]
    fn listing_deserializes_float_years_and_type_rename() {
        let listing: Listing = serde_json::from_str(
            r#"{"model": "ford f-150", "model_year": 2011.0, "type": "truck"}"#,
        )
        .unwrap();
        assert_eq!(listing.model_year, Some(2011));
        assert_eq!(listing.vehicle_type.as_deref(), Some("truck"));
        assert_eq!(listing.price, None);
        assert_eq!(listing.value(ListingColumn::Type), CellValue::Text("truck".into()));
    }

    #[test]
    fn fractional_and_out_of_range_years_are_undefined() {
        let listing: Listing =
            serde_json::from_str(r#"{"model_year": 2011.7, "odometer": 5.0}"#)
                .unwrap();
        assert_eq!(listing.model_year, None);
        assert_eq!(listing.odometer, Some(5.0));

        assert_eq!(whole_year(2013.0), Some(2013));
        assert_eq!(whole_year(f64::NAN), None);
        assert_eq!(whole_year(-0.5), None);
        assert_eq!(whole_year(1.0e12), None);
    }
}
