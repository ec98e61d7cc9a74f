use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const LISTINGS: usize = 5000;

/// (model, vehicle type, typical price when new)
const MODELS: &[(&str, &str, f64)] = &[
    ("ford f-150", "pickup", 38000.0),
    ("ford focus", "sedan", 19000.0),
    ("ford escape", "SUV", 25000.0),
    ("chevrolet silverado 1500", "truck", 36000.0),
    ("chevrolet malibu", "sedan", 22000.0),
    ("toyota camry", "sedan", 24000.0),
    ("toyota tacoma", "pickup", 30000.0),
    ("honda civic", "sedan", 20000.0),
    ("honda odyssey", "minivan", 31000.0),
    ("nissan altima", "sedan", 23000.0),
    ("jeep wrangler", "SUV", 29000.0),
    ("ram 1500", "truck", 35000.0),
    ("gmc sierra", "truck", 37000.0),
    ("subaru outback", "wagon", 27000.0),
    ("hyundai sonata", "sedan", 21000.0),
    ("kia soul", "hatchback", 17000.0),
    ("dodge grand caravan", "minivan", 26000.0),
    ("volkswagen jetta", "sedan", 20000.0),
    ("bmw x5", "SUV", 58000.0),
    ("cadillac escalade", "SUV", 75000.0),
    ("acura tl", "sedan", 35000.0),
    ("mercedes-benz benze sprinter 2500", "van", 45000.0),
];

const CONDITIONS: &[(&str, f64)] = &[
    ("new", 1.0),
    ("like new", 0.9),
    ("excellent", 0.75),
    ("good", 0.6),
    ("fair", 0.4),
    ("salvage", 0.15),
];

const COLORS: &[&str] = &[
    "white", "black", "silver", "grey", "blue", "red", "green", "brown", "custom", "yellow",
];

/// Seeded xoshiro256** source behind every draw of a synthetic listing, so
/// the same seed always yields the same sample files.
struct ListingRng {
    state: [u64; 4],
}

impl ListingRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        ListingRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Normal draw (Box-Muller) for vehicle ages, yearly mileage and price noise.
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Column-wise storage, one vector per listing field.
#[derive(Default)]
struct Columns {
    model: Vec<String>,
    model_year: Vec<Option<f64>>,
    price: Vec<i64>,
    odometer: Vec<Option<f64>>,
    paint_color: Vec<Option<String>>,
    vehicle_type: Vec<String>,
    condition: Vec<String>,
}

fn generate(rng: &mut ListingRng) -> Columns {
    let mut cols = Columns::default();

    for _ in 0..LISTINGS {
        let &(model, vehicle_type, new_price) = rng.pick(MODELS);
        let &(condition, condition_factor) = rng.pick(CONDITIONS);

        // Ages skew young; roughly 7% of listings have no model year, like the real data.
        let age = rng.gauss(8.0, 5.0).abs().min(50.0).round();
        let year = 2019.0 - age;
        let model_year = (!rng.chance(0.07)).then_some(year);

        let miles_per_year = rng.gauss(12000.0, 4000.0).max(1000.0);
        let odometer = (age.max(0.5) * miles_per_year).round();
        let odometer = (!rng.chance(0.15)).then_some(odometer);

        let depreciation = 0.85f64.powf(age);
        let price = (new_price * depreciation * condition_factor * rng.gauss(1.0, 0.1).max(0.3))
            .round()
            .max(1.0);

        let paint_color = (!rng.chance(0.18)).then(|| rng.pick(COLORS).to_string());

        cols.model.push(model.to_string());
        cols.model_year.push(model_year);
        cols.price.push(price as i64);
        cols.odometer.push(odometer);
        cols.paint_color.push(paint_color);
        cols.vehicle_type.push(vehicle_type.to_string());
        cols.condition.push(condition.to_string());
    }
    cols
}

fn write_csv(cols: &Columns, path: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "price",
        "model_year",
        "model",
        "condition",
        "odometer",
        "type",
        "paint_color",
    ])?;
    // Years and odometer are written as floats, the way a pandas export with gaps does.
    let float = |v: &Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_default();
    for i in 0..cols.model.len() {
        writer.write_record([
            cols.price[i].to_string(),
            float(&cols.model_year[i]),
            cols.model[i].clone(),
            cols.condition[i].clone(),
            float(&cols.odometer[i]),
            cols.vehicle_type[i].clone(),
            cols.paint_color[i].clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(cols: &Columns, path: &str) -> anyhow::Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("price", DataType::Int64, false),
        Field::new("model_year", DataType::Float64, true),
        Field::new("model", DataType::Utf8, false),
        Field::new("condition", DataType::Utf8, false),
        Field::new("odometer", DataType::Float64, true),
        Field::new("type", DataType::Utf8, false),
        Field::new("paint_color", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.price.clone())),
            Arc::new(Float64Array::from(cols.model_year.clone())),
            Arc::new(StringArray::from(cols.model.clone())),
            Arc::new(StringArray::from(cols.condition.clone())),
            Arc::new(Float64Array::from(cols.odometer.clone())),
            Arc::new(StringArray::from(cols.vehicle_type.clone())),
            Arc::new(StringArray::from(cols.paint_color.clone())),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut rng = ListingRng::new(42);
    let cols = generate(&mut rng);

    let csv_path = "vehicles_sample.csv";
    let parquet_path = "vehicles_sample.parquet";
    write_csv(&cols, csv_path)?;
    write_parquet(&cols, parquet_path)?;

    println!(
        "Wrote {} listings ({} models) to {csv_path} and {parquet_path}",
        cols.model.len(),
        MODELS.len()
    );
    Ok(())
}
