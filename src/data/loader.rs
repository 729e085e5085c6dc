use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType};
use calamine::{open_workbook_auto, Data, Reader};
use flate2::read::GzDecoder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::datetime::parse_datetime;
use super::model::{CellValue, Column, Dataset, StorageType};

/// Extensions accepted by [`load_table`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "csv", "csv.gz", "tsv", "json", "parquet", "pq", "xlsx", "xls", "xlsb", "ods",
];

/// Cell texts read as missing values.
const NA_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

const DELIMITER_CANDIDATES: &[u8] = b",;\t|";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Lower-cased extension, keeping the inner one for gzipped CSV (`csv.gz`).
fn extension(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let inner = path
        .file_stem()
        .map(Path::new)
        .and_then(|stem| stem.extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match (ext.as_str(), inner.as_deref()) {
        ("gz", Some("csv")) => "csv.gz".to_string(),
        _ => ext,
    }
}

/// Whether `path` has an extension [`load_table`] understands.
pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row, delimiter sniffed from the first line
/// * `.csv.gz`       – the same, gzip-compressed
/// * `.json`         – `[{ "col": value, ... }, ...]`
/// * `.parquet`      – any flat schema of primitive columns
/// * `.xlsx` & co.   – one worksheet (`sheet` by name or zero-based index, first by default)
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let dataset = match extension(path).as_str() {
        "csv" | "tsv" => load_csv(path, false),
        "csv.gz" => load_csv(path, true),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        "xlsx" | "xls" | "xlsb" | "ods" => load_excel(path, sheet),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} rows × {} columns from {}",
        dataset.len(),
        dataset.width(),
        path.display()
    );
    Ok(dataset)
}

/// Make header names unique and non-empty, the way dataframe readers do:
/// blanks become `Unnamed: <index>`, repeats get a `.1`, `.2`… suffix.
fn unique_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while seen.contains(&candidate) {
                candidate = format!("{base}.{n}");
                n += 1;
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn is_na_marker(s: &str) -> bool {
    NA_MARKERS.contains(&s)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Open a CSV file as text, decompressing gzip on the fly.
fn open_csv(path: &Path, gzipped: bool) -> Result<Box<dyn Read>> {
    let file = BufReader::new(File::open(path).context("opening CSV")?);
    Ok(if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    })
}

/// Pick the candidate delimiter occurring most often in the header line.
fn sniff_delimiter(header_line: &str) -> u8 {
    DELIMITER_CANDIDATES
        .iter()
        .map(|&d| (d, header_line.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map_or(b',', |(d, _)| d)
}

fn load_csv(path: &Path, gzipped: bool) -> Result<Dataset> {
    let mut header_line = String::new();
    BufReader::new(open_csv(path, gzipped)?)
        .read_line(&mut header_line)
        .context("reading CSV header line")?;
    let delimiter = sniff_delimiter(&header_line);
    log::debug!("CSV delimiter for {}: {:?}", path.display(), delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(open_csv(path, gzipped)?);
    let headers = unique_headers(
        reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.to_string()),
    );

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell).collect());
    }

    Dataset::from_rows(&headers, rows).context("assembling CSV table")
}

/// Type one CSV cell: missing marker, integer, float, boolean or text.
fn guess_cell(s: &str) -> CellValue {
    if is_na_marker(s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "Alice", "age": 25, "city": "NY" },
///   { "name": "Bob",   "age": 30, "city": null },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; absent keys are missing values.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Dataset::from_rows(&headers, rows).context("assembling JSON table")
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with a flat schema.
///
/// Integer, float, boolean, string, date and timestamp columns keep their
/// storage; anything else is rendered to text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let storages: Vec<StorageType> = schema
        .fields()
        .iter()
        .map(|f| arrow_storage(f.data_type()))
        .collect();
    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); storages.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, storage) in storages.iter().enumerate() {
            let name = schema.field(idx).name();
            read_arrow_column(batch.column(idx), *storage, &mut values[idx])
                .with_context(|| format!("reading parquet column '{name}'"))?;
        }
    }

    let names = unique_headers(schema.fields().iter().map(|f| f.name().clone()));
    let columns = names
        .into_iter()
        .zip(storages)
        .zip(values)
        .map(|((name, storage), vals)| Column::with_storage(name, storage, vals))
        .collect();
    Dataset::new(columns).context("assembling parquet table")
}

// -- Parquet / Arrow helpers --

fn arrow_storage(data_type: &DataType) -> StorageType {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => StorageType::Integer,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => StorageType::Float,
        DataType::Boolean => StorageType::Boolean,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => StorageType::DateTime,
        _ => StorageType::Text,
    }
}

/// Append the cells of one Arrow column to `out`, casting to the canonical
/// array type of `storage` first.
fn read_arrow_column(col: &ArrayRef, storage: StorageType, out: &mut Vec<CellValue>) -> Result<()> {
    match storage {
        StorageType::Integer => {
            let arr = cast(col.as_ref(), &DataType::Int64)?;
            let arr = arr.as_primitive::<Int64Type>();
            out.extend((0..arr.len()).map(|i| {
                if arr.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Integer(arr.value(i))
                }
            }));
        }
        StorageType::Float => {
            let arr = cast(col.as_ref(), &DataType::Float64)?;
            let arr = arr.as_primitive::<Float64Type>();
            out.extend((0..arr.len()).map(|i| {
                if arr.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Float(arr.value(i))
                }
            }));
        }
        StorageType::Boolean => {
            let arr = col.as_boolean();
            out.extend((0..arr.len()).map(|i| {
                if arr.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Bool(arr.value(i))
                }
            }));
        }
        StorageType::DateTime => {
            let arr = cast(col.as_ref(), &DataType::Timestamp(TimeUnit::Millisecond, None))?;
            let arr = arr.as_primitive::<TimestampMillisecondType>();
            out.extend((0..arr.len()).map(|i| {
                if arr.is_null(i) {
                    return CellValue::Null;
                }
                chrono::DateTime::from_timestamp_millis(arr.value(i))
                    .map_or(CellValue::Null, |dt| CellValue::DateTime(dt.naive_utc()))
            }));
        }
        StorageType::Text => {
            let arr = cast(col.as_ref(), &DataType::Utf8)?;
            let arr = arr.as_string::<i32>();
            out.extend((0..arr.len()).map(|i| {
                if arr.is_null(i) {
                    CellValue::Null
                } else {
                    CellValue::Text(arr.value(i).to_string())
                }
            }));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Resolve the requested sheet by name, then by zero-based index.
/// `None` selects the first sheet.
fn pick_sheet(names: &[String], sheet: Option<&str>) -> Result<String> {
    match sheet {
        None => names.first().cloned(),
        Some(wanted) => names
            .iter()
            .find(|name| name.as_str() == wanted)
            .or_else(|| wanted.parse::<usize>().ok().and_then(|i| names.get(i)))
            .cloned(),
    }
    .with_context(|| match sheet {
        Some(wanted) => format!("Sheet '{wanted}' not found (available: {})", names.join(", ")),
        None => "Workbook contains no sheets".to_string(),
    })
}

/// Load one worksheet; the first row holds the headers.
fn load_excel(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;

    let sheet_name = pick_sheet(&workbook.sheet_names(), sheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let headers = unique_headers(
        rows.next()
            .map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>())
            .unwrap_or_default(),
    );
    let records = rows.map(|r| r.iter().map(excel_cell).collect()).collect();

    Dataset::from_rows(&headers, records)
        .with_context(|| format!("assembling sheet '{sheet_name}'"))
}

fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if is_na_marker(s.trim()) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Float(dt.as_f64()), CellValue::DateTime),
        Data::DateTimeIso(s) => parse_datetime(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}
