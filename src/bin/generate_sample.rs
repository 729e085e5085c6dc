use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const ROWS: usize = 1_000;
const REGIONS: &[&str] = &["North", "South", "East", "West"];
const PRODUCTS: &[(&str, f64)] = &[
    ("Laptop", 1_199.0),
    ("Monitor", 289.0),
    ("Keyboard", 59.0),
    ("Mouse", 25.0),
    ("Headset", 89.0),
    ("Webcam", 74.0),
    ("Dock", 189.0),
    ("Cable", 12.0),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }
}

/// One generated order.
struct Order {
    id: i64,
    date: NaiveDate,
    region: &'static str,
    product: &'static str,
    customer: String,
    quantity: i64,
    unit_price: f64,
    discount: Option<f64>,
    returned: bool,
}

impl Order {
    fn revenue(&self) -> f64 {
        let gross = self.quantity as f64 * self.unit_price;
        let net = gross * (1.0 - self.discount.unwrap_or(0.0));
        (net * 100.0).round() / 100.0
    }
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<Order>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;
    Ok((0..ROWS)
        .map(|i| {
            let (product, list_price) = PRODUCTS[rng.below(PRODUCTS.len())];
            // +/- 10 % price noise around list price
            let unit_price = (list_price * (0.9 + 0.2 * rng.next_f64()) * 100.0).round() / 100.0;
            let discount = match rng.below(10) {
                0..=5 => Some(0.0),
                6 | 7 => Some(0.1),
                8 => Some(0.25),
                _ => None,
            };
            Order {
                id: i as i64 + 1,
                date: start + Duration::days(rng.below(366) as i64),
                region: REGIONS[rng.below(REGIONS.len())],
                product,
                customer: format!("Customer {:04}", rng.below(400) + 1),
                quantity: rng.below(9) as i64 + 1,
                unit_price,
                discount,
                returned: rng.below(20) == 0,
            }
        })
        .collect())
}

fn to_batch(orders: &[Order]) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, false),
        Field::new("order_date", DataType::Date32, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("customer", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("unit_price", DataType::Float64, false),
        Field::new("discount", DataType::Float64, true),
        Field::new("revenue", DataType::Float64, false),
        Field::new("returned", DataType::Boolean, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(orders.iter().map(|o| o.id))),
        Arc::new(Date32Array::from_iter_values(
            orders.iter().map(|o| (o.date - epoch).num_days() as i32),
        )),
        Arc::new(StringArray::from_iter_values(orders.iter().map(|o| o.region))),
        Arc::new(StringArray::from_iter_values(orders.iter().map(|o| o.product))),
        Arc::new(StringArray::from_iter_values(orders.iter().map(|o| o.customer.as_str()))),
        Arc::new(Int64Array::from_iter_values(orders.iter().map(|o| o.quantity))),
        Arc::new(Float64Array::from_iter_values(orders.iter().map(|o| o.unit_price))),
        Arc::new(orders.iter().map(|o| o.discount).collect::<Float64Array>()),
        Arc::new(Float64Array::from_iter_values(orders.iter().map(Order::revenue))),
        Arc::new(orders.iter().map(|o| Some(o.returned)).collect::<BooleanArray>()),
    ];

    RecordBatch::try_new(schema, columns).context("Failed to create RecordBatch")
}

fn write_csv(path: &str, orders: &[Order]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    wtr.write_record([
        "order_id", "order_date", "region", "product", "customer", "quantity", "unit_price", "discount",
        "revenue", "returned",
    ])?;
    for o in orders {
        wtr.write_record([
            o.id.to_string(),
            o.date.format("%Y-%m-%d").to_string(),
            o.region.to_string(),
            o.product.to_string(),
            o.customer.clone(),
            o.quantity.to_string(),
            o.unit_price.to_string(),
            o.discount.map(|d| d.to_string()).unwrap_or_default(),
            o.revenue().to_string(),
            o.returned.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_parquet(path: &str, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("Failed to create writer")?;
    writer.write(batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let orders = generate(&mut rng)?;
    let batch = to_batch(&orders)?;

    write_csv("sample_sales.csv", &orders)?;
    write_parquet("sample_sales.parquet", &batch)?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!("Wrote {} orders to sample_sales.csv and sample_sales.parquet", orders.len());
    Ok(())
}
