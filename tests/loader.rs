use std::fs;
use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;
use parquet::arrow::ArrowWriter;

use csvdash::data::loader::{is_supported, load_table};
use csvdash::data::{classify, CellValue, ColumnType, StorageType};

#[test]
fn csv_cells_are_typed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    fs::write(
        &path,
        "name,age,score,active,joined\nAlice,25,1.5,true,2024-01-05\nBob,NA,2.5,FALSE,2024-02-10\nCharlie,35,,True,2024-03-15\n",
    )
    .unwrap();

    let ds = load_table(&path, None).unwrap();
    assert_eq!(ds.column_names(), vec!["name", "age", "score", "active", "joined"]);
    assert_eq!(ds.len(), 3);

    let age = ds.column("age").unwrap();
    assert_eq!(age.storage, StorageType::Integer);
    assert_eq!(age.values[1], CellValue::Null);
    assert_eq!(ds.column("score").unwrap().storage, StorageType::Float);
    assert_eq!(ds.column("active").unwrap().storage, StorageType::Boolean);

    let types = classify(&ds);
    assert_eq!(types.get("joined"), Some(ColumnType::Datetime));
    assert_eq!(types.get("active"), Some(ColumnType::Boolean));
}

#[test]
fn csv_delimiter_is_sniffed() {
    let dir = tempfile::tempdir().unwrap();
    let semi = dir.path().join("semi.csv");
    fs::write(&semi, "city;pop\nParis;2.1\nLyon;0.5\n").unwrap();
    let ds = load_table(&semi, None).unwrap();
    assert_eq!(ds.column_names(), vec!["city", "pop"]);
    assert_eq!(ds.column("pop").unwrap().values[0], CellValue::Float(2.1));

    let tsv = dir.path().join("tabs.tsv");
    fs::write(&tsv, "a\tb\n1\tx\n").unwrap();
    let ds = load_table(&tsv, None).unwrap();
    assert_eq!(ds.column_names(), vec!["a", "b"]);
}

#[test]
fn gzipped_csv_is_decompressed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(b"region;amount;day\nnorth;12.5;2024-01-01\nsouth;NA;2024-01-02\n")
        .unwrap();
    fs::write(&path, encoder.finish().unwrap()).unwrap();

    assert!(is_supported(&path));
    let ds = load_table(&path, None).unwrap();
    assert_eq!(ds.column_names(), vec!["region", "amount", "day"]);
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.column("amount").unwrap().values[0], CellValue::Float(12.5));
    assert_eq!(ds.column("amount").unwrap().values[1], CellValue::Null);
    assert_eq!(ds.column("region").unwrap().values[1], CellValue::from("south"));
}

#[test]
fn json_records_keep_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.json");
    fs::write(
        &path,
        r#"[{"zeta": 1, "alpha": "x"}, {"alpha": null, "zeta": 2.5, "extra": true}]"#,
    )
    .unwrap();

    let ds = load_table(&path, None).unwrap();
    assert_eq!(ds.column_names(), vec!["zeta", "alpha", "extra"]);
    assert_eq!(ds.column("zeta").unwrap().storage, StorageType::Float);
    assert_eq!(ds.column("alpha").unwrap().values[1], CellValue::Null);
    assert_eq!(ds.column("extra").unwrap().values[0], CellValue::Null);
    assert_eq!(ds.column("extra").unwrap().values[1], CellValue::Bool(true));
}

#[test]
fn json_must_be_an_array_of_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"a": 1}"#).unwrap();
    assert!(load_table(&path, None).is_err());
}

#[test]
fn parquet_schema_drives_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("qty", DataType::Int32, false),
        Field::new("price", DataType::Float64, true),
        Field::new("region", DataType::Utf8, false),
        Field::new("day", DataType::Date32, false),
    ]));
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let epoch_days = (day - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32;
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(vec![1, 2, 3])),
        Arc::new(Float64Array::from(vec![Some(9.5), None, Some(1.0)])),
        Arc::new(StringArray::from(vec!["n", "s", "n"])),
        Arc::new(Date32Array::from(vec![epoch_days, epoch_days + 1, epoch_days + 2])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_table(&path, None).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.column("qty").unwrap().storage, StorageType::Integer);
    assert_eq!(ds.column("qty").unwrap().values[2], CellValue::Integer(3));
    assert_eq!(ds.column("price").unwrap().values[1], CellValue::Null);
    assert_eq!(ds.column("region").unwrap().storage, StorageType::Text);
    assert_eq!(
        ds.column("day").unwrap().values[0],
        CellValue::DateTime(day.and_hms_opt(0, 0, 0).unwrap())
    );
    assert_eq!(classify(&ds).get("day"), Some(ColumnType::Datetime));
}

#[test]
fn missing_and_unsupported_files_fail() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_table(&dir.path().join("absent.csv"), None).is_err());

    let txt = dir.path().join("notes.txt");
    fs::write(&txt, "hello").unwrap();
    let err = load_table(&txt, None).unwrap_err();
    assert!(err.to_string().contains("Unsupported"));
}
