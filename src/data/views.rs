//! Aggregate views: one builder per dashboard chart.
//!
//! Every builder is a pure function of the derived table and its scalar
//! parameters. Column names of each view are part of its contract with the
//! chart adapter and are listed on the builder.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use super::derive::{DerivedListing, DerivedListingTable};
use super::error::SchemaError;
use super::filter::{rows_above_odometer, rows_with_brand_in, rows_younger_than, top_brands};
use super::model::{CellValue, ListingColumn};

pub const TOP_N: usize = 10;
pub const HIGH_MILEAGE_THRESHOLD: f64 = 200_000.0;
pub const AGE_THRESHOLD: i32 = 10;

// ---------------------------------------------------------------------------
// AggregateView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Scatter,
    TopBrandsType,
    HighMileageType,
    MeanByCategory,
    ReshapedYearCondition,
    CountByCategory,
    DispersionByBrand,
}

/// A materialized table produced for one chart. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateView {
    kind: ViewKind,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl AggregateView {
    fn new(kind: ViewKind, columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        AggregateView {
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Grouping helpers
// ---------------------------------------------------------------------------

/// Group rows by key, keeping groups in first-seen key order.
/// Rows mapping to `None` never form a group.
fn group_first_seen<'a, K, I>(
    rows: I,
    key: impl Fn(&DerivedListing) -> Option<K>,
) -> Vec<(K, Vec<&'a DerivedListing>)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a DerivedListing>,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a DerivedListing>)> = Vec::new();

    for row in rows {
        let Some(k) = key(row) else {
            continue;
        };
        let slot = *slots.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }
    groups
}

fn defined(value: CellValue) -> Option<CellValue> {
    (!value.is_null()).then_some(value)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator); undefined below two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

fn count_cell(n: usize) -> CellValue {
    CellValue::Integer(n as i64)
}

fn select<'a>(
    table: &'a DerivedListingTable,
    indices: &[usize],
) -> impl Iterator<Item = &'a DerivedListing> + 'a {
    let rows = table.rows();
    indices.to_vec().into_iter().map(move |i| &rows[i])
}

// ---------------------------------------------------------------------------
// View builders
// ---------------------------------------------------------------------------

/// `(odometer, price, brand)` for every listing, unaggregated.
pub fn scatter_view(table: &DerivedListingTable) -> Result<AggregateView, SchemaError> {
    let cols = [ListingColumn::Odometer, ListingColumn::Price, ListingColumn::Brand];
    table.require(&cols)?;

    let rows = table
        .rows()
        .iter()
        .map(|row| cols.iter().map(|&c| row.value(c)).collect())
        .collect();
    Ok(AggregateView::new(ViewKind::Scatter, &["odometer", "price", "brand"], rows))
}

/// `(brand, type, count)` over listings of the `top_n` most frequent brands.
pub fn top_brands_type_view(
    table: &DerivedListingTable,
    top_n: usize,
) -> Result<AggregateView, SchemaError> {
    table.require(&[ListingColumn::Brand, ListingColumn::Type])?;

    let brands = top_brands(table, top_n);
    let kept = rows_with_brand_in(table, &brands);
    let groups = group_first_seen(select(table, &kept), |row| {
        Some((row.brand()?.to_string(), row.listing().vehicle_type.clone()?))
    });

    let rows = groups
        .into_iter()
        .map(|((brand, vehicle_type), members)| {
            vec![
                CellValue::Text(brand),
                CellValue::Text(vehicle_type),
                count_cell(members.len()),
            ]
        })
        .collect();
    Ok(AggregateView::new(ViewKind::TopBrandsType, &["brand", "type", "count"], rows))
}

/// `(vehicle_type, vehicle_count)` over listings with `odometer > threshold`,
/// most common type first.
pub fn high_mileage_type_view(
    table: &DerivedListingTable,
    threshold: f64,
) -> Result<AggregateView, SchemaError> {
    table.require(&[ListingColumn::Odometer, ListingColumn::Type])?;

    let kept = rows_above_odometer(table, threshold);
    let mut groups = group_first_seen(select(table, &kept), |row| {
        row.listing().vehicle_type.clone()
    });
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let rows = groups
        .into_iter()
        .map(|(vehicle_type, members)| {
            vec![CellValue::Text(vehicle_type), count_cell(members.len())]
        })
        .collect();
    Ok(AggregateView::new(
        ViewKind::HighMileageType,
        &["vehicle_type", "vehicle_count"],
        rows,
    ))
}

/// `(<category>, <measure>)`: mean of `measure` per category value.
///
/// Undefined measures are skipped; a category whose measures are all
/// undefined gets a `Null` mean.
pub fn mean_by_category_view(
    table: &DerivedListingTable,
    category: ListingColumn,
    measure: ListingColumn,
) -> Result<AggregateView, SchemaError> {
    table.require(&[category, measure])?;
    if !measure.is_numeric() {
        return Err(SchemaError::NotNumeric(measure));
    }

    let groups = group_first_seen(table.rows(), |row| defined(row.value(category)));
    let rows = groups
        .into_iter()
        .map(|(key, members)| {
            let values: Vec<f64> = members
                .iter()
                .filter_map(|row| row.value(measure).as_f64())
                .collect();
            vec![key, mean(&values).into()]
        })
        .collect();
    Ok(AggregateView::new(
        ViewKind::MeanByCategory,
        &[category.name(), measure.name()],
        rows,
    ))
}

/// `(model_year, condition, count)`: year × condition cross-tabulation of
/// priced listings, unpivoted to long form. Listings without a condition or
/// price are not counted, so a year's total covers only rows with both.
///
/// Every observed year gets an entry for every observed condition; absent
/// combinations are filled with 0. Rows are ordered by condition, then year.
pub fn reshaped_year_condition_view(
    table: &DerivedListingTable,
) -> Result<AggregateView, SchemaError> {
    table.require(&[ListingColumn::ModelYear, ListingColumn::Condition, ListingColumn::Price])?;

    let mut years: BTreeSet<i32> = BTreeSet::new();
    let mut conditions: BTreeSet<&str> = BTreeSet::new();
    let mut counts: HashMap<(i32, &str), usize> = HashMap::new();

    for row in table.rows() {
        let listing = row.listing();
        let (Some(year), Some(condition)) = (listing.model_year, listing.condition.as_deref())
        else {
            continue;
        };
        years.insert(year);
        conditions.insert(condition);
        if listing.price.is_some() {
            *counts.entry((year, condition)).or_default() += 1;
        }
    }

    let (years, counts) = (&years, &counts);
    let rows = conditions
        .iter()
        .flat_map(move |&condition| {
            years.iter().map(move |&year| {
                vec![
                    CellValue::Integer(i64::from(year)),
                    CellValue::Text(condition.to_string()),
                    count_cell(counts.get(&(year, condition)).copied().unwrap_or(0)),
                ]
            })
        })
        .collect();
    Ok(AggregateView::new(
        ViewKind::ReshapedYearCondition,
        &["model_year", "condition", "count"],
        rows,
    ))
}

/// `(<category>, vehicle_count)`: listings per category value, in the order
/// categories are first encountered.
pub fn count_by_category_view(
    table: &DerivedListingTable,
    category: ListingColumn,
) -> Result<AggregateView, SchemaError> {
    table.require(&[category])?;

    let rows = group_first_seen(table.rows(), |row| defined(row.value(category)))
        .into_iter()
        .map(|(key, members)| vec![key, count_cell(members.len())])
        .collect();
    Ok(AggregateView::new(
        ViewKind::CountByCategory,
        &[category.name(), "vehicle_count"],
        rows,
    ))
}

/// `(brand, avg_mileage, std_mileage, vehicle_count)` over listings younger
/// than `age_threshold`, highest average first.
///
/// `std_mileage` is the sample standard deviation and is `Null` for brands
/// with fewer than two odometer readings. `vehicle_count` is the group size.
pub fn dispersion_by_brand_view(
    table: &DerivedListingTable,
    age_threshold: i32,
) -> Result<AggregateView, SchemaError> {
    table.require(&[ListingColumn::Brand, ListingColumn::VehicleAge, ListingColumn::Odometer])?;

    let kept = rows_younger_than(table, age_threshold);
    let mut stats: Vec<(String, Option<f64>, Option<f64>, usize)> =
        group_first_seen(select(table, &kept), |row| row.brand().map(str::to_string))
            .into_iter()
            .map(|(brand, members)| {
                let readings: Vec<f64> =
                    members.iter().filter_map(|row| row.listing().odometer).collect();
                (brand, mean(&readings), sample_std(&readings), members.len())
            })
            .collect();

    // Descending by mean, undefined means last; stable for ties.
    stats.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let rows = stats
        .into_iter()
        .map(|(brand, avg, std, n)| {
            vec![CellValue::Text(brand), avg.into(), std.into(), count_cell(n)]
        })
        .collect();
    Ok(AggregateView::new(
        ViewKind::DispersionByBrand,
        &["brand", "avg_mileage", "std_mileage", "vehicle_count"],
        rows,
    ))
}
