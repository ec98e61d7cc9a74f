use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{whole_year, CellValue, Listing, ListingColumn, RawListingTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row naming the columns (the `vehicles_us.csv` layout)
/// * `.json`    – `[{ "model": "...", "model_year": 2011, ... }, ...]`
/// * `.parquet` – one column per field, as written by `df.to_parquet()`
///
/// Every format must declare all raw listing columns; a missing one fails
/// with [`SchemaError::MissingColumn`](super::error::SchemaError) before any
/// row is read. Extra columns are ignored.
pub fn load_file(path: &Path) -> Result<RawListingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    if table.is_empty() {
        log::warn!("{} holds no listings", path.display());
    } else {
        log::info!("Loaded {} listings from {}", table.len(), path.display());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawListingTable> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse listings from any CSV source with a header row.
pub fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<RawListingTable> {
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let declared: BTreeSet<ListingColumn> = ListingColumn::RAW
        .into_iter()
        .filter(|col| headers.iter().any(|h| h == col.name()))
        .collect();
    RawListingTable::with_columns(declared.iter().copied(), Vec::new()).validate()?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.deserialize::<Listing>().enumerate() {
        let listing = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(listing);
    }

    Ok(RawListingTable::with_columns(declared, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<RawListingTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    read_json(&text)
}

/// Parse records-oriented JSON (`df.to_json(orient='records')`).
///
/// A column counts as declared when at least one record carries its key;
/// records missing the key hold an undefined value for it.
pub fn read_json(text: &str) -> Result<RawListingTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut declared = BTreeSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        declared.extend(
            ListingColumn::RAW
                .into_iter()
                .filter(|col| obj.contains_key(col.name())),
        );
        let listing: Listing = serde_json::from_value(rec.clone())
            .with_context(|| format!("Row {i}: invalid listing"))?;
        rows.push(listing);
    }

    let table = RawListingTable::with_columns(declared, rows);
    table.validate()?;
    Ok(table)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per listing field.
///
/// Text columns may be `Utf8` or `LargeUtf8`; numeric columns may be any of
/// `Int32`, `Int64`, `Float32`, `Float64`. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawListingTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let declared: BTreeSet<ListingColumn> = ListingColumn::RAW
        .into_iter()
        .filter(|col| schema.index_of(col.name()).is_ok())
        .collect();
    RawListingTable::with_columns(declared.iter().copied(), Vec::new()).validate()?;

    let reader = builder.build().context("building parquet reader")?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_schema = batch.schema();

        // Column index for each raw field, in `ListingColumn::RAW` order.
        let columns: Vec<ArrayRef> = ListingColumn::RAW
            .into_iter()
            .map(|col| {
                batch_schema
                    .index_of(col.name())
                    .map(|idx| batch.column(idx).clone())
                    .with_context(|| format!("record batch lacks '{col}'"))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let cell = |field: usize| extract_cell(&columns[field], row);
            rows.push(Listing {
                model: text(cell(0)),
                model_year: number(cell(1)).and_then(whole_year),
                price: number(cell(2)),
                odometer: number(cell(3)),
                paint_color: text(cell(4)),
                vehicle_type: text(cell(5)),
                condition: text(cell(6)),
            });
        }
    }

    Ok(RawListingTable::with_columns(declared, rows))
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(i64::from(col.as_primitive::<Int32Type>().value(row))),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::Float(f64::from(col.as_primitive::<Float32Type>().value(row)))
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        other => {
            log::warn!("Unsupported parquet column type {other:?}; reading as null");
            CellValue::Null
        }
    }
}

fn text(cell: CellValue) -> Option<String> {
    match cell {
        CellValue::Text(s) => Some(s),
        CellValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Pandas writes missing floats as NaN rather than null in some exports.
fn number(cell: CellValue) -> Option<f64> {
    cell.as_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::derive::derive;
    use crate::data::error::SchemaError;
    use crate::data::views::{dispersion_by_brand_view, AGE_THRESHOLD};

    const HEADER: &str = "price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed";

    fn csv_table(body: &str) -> Result<RawListingTable> {
        let data = format!("{HEADER}\n{body}");
        read_csv(csv::Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn reads_vehicles_us_layout() {
        let table = csv_table(
            "9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19\n\
             25500,,ford f-150,good,6.0,gas,88705.0,automatic,pickup,white,1.0,2018-10-19,50\n",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.model.as_deref(), Some("bmw x5"));
        assert_eq!(first.model_year, Some(2011));
        assert_eq!(first.odometer, Some(145000.0));
        assert_eq!(first.vehicle_type.as_deref(), Some("SUV"));
        assert_eq!(first.paint_color, None);
        assert_eq!(table.rows()[1].model_year, None);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn nan_cells_load_as_undefined() {
        let table = csv_table(
            "NaN,2015,ford focus,good,4,gas,NaN,automatic,sedan,blue,0,2018-06-23,19\n\
             9000,2015,honda civic,good,4,gas,50000,automatic,sedan,red,0,2018-06-23,19\n\
             7000,2015.5,kia soul,good,4,gas,inf,automatic,hatchback,red,0,2018-06-23,19\n",
        )
        .unwrap();
        let first = &table.rows()[0];
        assert_eq!(first.price, None);
        assert_eq!(first.odometer, None);
        assert_eq!(table.rows()[2].odometer, None);
        assert_eq!(table.rows()[2].model_year, None);

        let view = dispersion_by_brand_view(&derive(table), AGE_THRESHOLD).unwrap();
        assert_eq!(
            view.rows().to_vec(),
            vec![
                vec![
                    CellValue::Text("honda".into()),
                    CellValue::Float(50000.0),
                    CellValue::Null,
                    CellValue::Integer(1),
                ],
                vec![
                    CellValue::Text("ford".into()),
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::Integer(1),
                ],
            ]
        );
    }

    #[test]
    fn missing_csv_column_is_a_schema_error() {
        let data = "price,model_year,model,condition,odometer,type\n1,2011,bmw x5,good,1,SUV\n";
        let err = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::MissingColumn(ListingColumn::PaintColor))
        );
    }

    #[test]
    fn unparseable_cell_reports_row() {
        let err = csv_table("cheap,2011,bmw x5,good,6,gas,1,automatic,SUV,red,1,2018-06-23,19\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 0"));
    }

    #[test]
    fn json_records_declare_columns_by_key() {
        let table = read_json(
            r#"[
                {"model": "honda civic", "model_year": 2014, "price": 9000, "odometer": 80000,
                 "paint_color": null, "type": "sedan", "condition": "excellent"},
                {"model": "kia soul", "type": "hatchback"}
            ]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].price, Some(9000.0));
        assert_eq!(table.rows()[1].condition, None);

        let err = read_json(r#"[{"model": "kia soul"}]"#).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::MissingColumn(ListingColumn::ModelYear))
        );
    }

    #[test]
    fn parquet_round_trip_through_file() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("model", DataType::Utf8, true),
            Field::new("model_year", DataType::Float64, true),
            Field::new("price", DataType::Int64, true),
            Field::new("odometer", DataType::Float64, true),
            Field::new("paint_color", DataType::Utf8, true),
            Field::new("type", DataType::Utf8, true),
            Field::new("condition", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("chevrolet silverado"), None])),
                Arc::new(Float64Array::from(vec![Some(2013.0), Some(f64::NAN)])),
                Arc::new(Int64Array::from(vec![Some(15000), Some(3000)])),
                Arc::new(Float64Array::from(vec![None, Some(210000.0)])),
                Arc::new(StringArray::from(vec![Some("black"), None])),
                Arc::new(StringArray::from(vec![Some("truck"), Some("sedan")])),
                Arc::new(StringArray::from(vec![Some("good"), Some("salvage")])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.model.as_deref(), Some("chevrolet silverado"));
        assert_eq!(first.model_year, Some(2013));
        assert_eq!(first.price, Some(15000.0));
        assert_eq!(first.odometer, None);
        let second = &table.rows()[1];
        assert_eq!(second.model, None);
        assert_eq!(second.model_year, None);
        assert_eq!(second.odometer, Some(210000.0));
    }

    #[test]
    fn dispatches_on_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"model": "ram 1500", "model_year": 2016, "price": 1, "odometer": 2,
                 "paint_color": "red", "type": "truck", "condition": "good"}}]"#
        )
        .unwrap();
        assert_eq!(load_file(file.path()).unwrap().len(), 1);

        let err = load_file(Path::new("listings.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
