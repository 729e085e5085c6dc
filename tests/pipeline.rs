use csvdash::data::summary::{ChartBucket, ColumnSummary};
use csvdash::data::{
    apply, classify, summarize, CellValue, Column, ColumnType, Dataset, FilterPredicate, SELECT_ALL,
};
use csvdash::error::CoreError;

fn people() -> Dataset {
    Dataset::new(vec![
        Column::new("name", vec!["Alice".into(), "Bob".into(), "Charlie".into()]),
        Column::new(
            "age",
            vec![CellValue::Integer(25), CellValue::Integer(30), CellValue::Integer(35)],
        ),
        Column::new("city", vec!["NY".into(), "London".into(), "Tokyo".into()]),
    ])
    .unwrap()
}

fn orders() -> Dataset {
    let regions = ["north", "south", "north", "east", "north", "south", "north", "south"];
    Dataset::new(vec![
        Column::new("region", regions.iter().map(|&r| r.into()).collect()),
        Column::new(
            "amount",
            vec![
                CellValue::Float(12.5),
                CellValue::Float(80.0),
                CellValue::Null,
                CellValue::Float(45.0),
                CellValue::Float(30.0),
                CellValue::Float(99.0),
                CellValue::Float(5.0),
                CellValue::Float(61.0),
            ],
        ),
        Column::new(
            "ordered",
            (1..=8).map(|d| CellValue::Text(format!("2024-03-{d:02} 10:00"))).collect(),
        ),
        Column::new(
            "note",
            (1..=8).map(|i| CellValue::Text(format!("order #{i}"))).collect(),
        ),
    ])
    .unwrap()
}

#[test]
fn scenario_types() {
    let ds = people();
    let types = classify(&ds);
    assert_eq!(types.get("age"), Some(ColumnType::Numeric));
    // three distinct values in three rows is not below half the row count
    assert_eq!(types.get("name"), Some(ColumnType::Text));
    assert_eq!(types.get("city"), Some(ColumnType::Text));
}

#[test]
fn scenario_numeric_range() {
    let ds = people();
    let types = classify(&ds);
    let out = apply(&ds, &types, &[FilterPredicate::numeric_range("age", 30.0, 35.0)]).unwrap();
    assert_eq!(
        out.column("name").unwrap().values,
        vec![CellValue::from("Bob"), CellValue::from("Charlie")]
    );
}

#[test]
fn scenario_age_summary() {
    let ds = people();
    let types = classify(&ds);
    let report = summarize(&ds, &types, 20).unwrap();
    let ColumnSummary::Numeric(age) = &report.get("age").unwrap().summary else {
        panic!("age should be numeric");
    };
    assert_eq!(age.count, 3);
    assert_eq!(age.mean, 30.0);
    assert_eq!(age.min, 25.0);
    assert_eq!(age.max, 35.0);
    assert_eq!(age.missing_pct, 0.0);
}

#[test]
fn classify_is_idempotent() {
    let ds = orders();
    assert_eq!(classify(&ds), classify(&ds));
    let types = classify(&ds);
    assert_eq!(types.get("region"), Some(ColumnType::Categorical));
    assert_eq!(types.get("amount"), Some(ColumnType::Numeric));
    assert_eq!(types.get("ordered"), Some(ColumnType::Datetime));
    assert_eq!(types.get("note"), Some(ColumnType::Text));
}

#[test]
fn empty_predicates_are_identity() {
    let ds = orders();
    let types = classify(&ds);
    assert_eq!(apply(&ds, &types, &[]).unwrap(), ds);
}

#[test]
fn select_all_is_a_no_op() {
    let ds = orders();
    let types = classify(&ds);
    let out = apply(&ds, &types, &[FilterPredicate::categorical_in("region", [SELECT_ALL, "east"])]).unwrap();
    assert_eq!(out, ds);
}

#[test]
fn combined_filters_narrow_and_keep_shape() {
    let ds = orders();
    let types = classify(&ds);
    let predicates = vec![
        FilterPredicate::categorical_in("region", ["north", "south"]),
        FilterPredicate::numeric_range("amount", 10.0, 90.0),
        FilterPredicate::date_range("ordered", "2024-03-01", "2024-03-06"),
        FilterPredicate::text_search("ORDER"),
    ];
    let out = apply(&ds, &types, &predicates).unwrap();

    assert!(out.len() <= ds.len());
    assert_eq!(out.column_names(), ds.column_names());
    // every other row fails at least one predicate
    assert_eq!(
        out.column("note").unwrap().values,
        vec![
            CellValue::from("order #1"),
            CellValue::from("order #2"),
            CellValue::from("order #5"),
        ]
    );
}

#[test]
fn mismatched_predicates_are_ignored() {
    let ds = orders();
    let types = classify(&ds);
    let predicates = vec![
        FilterPredicate::numeric_range("region", 0.0, 1.0),
        FilterPredicate::categorical_in("amount", ["5"]),
        FilterPredicate::date_range("note", "2024-01-01", "2024-01-02"),
        FilterPredicate::numeric_range("missing_column", 0.0, 1.0),
    ];
    assert_eq!(apply(&ds, &types, &predicates).unwrap(), ds);
}

#[test]
fn malformed_type_map_is_an_error() {
    let ds = orders();
    let mut types = classify(&ds);
    types.insert("ghost", ColumnType::Numeric);
    assert!(matches!(
        apply(&ds, &types, &[]),
        Err(CoreError::UnknownColumn(c)) if c == "ghost"
    ));
}

#[test]
fn summary_of_filtered_view() {
    let ds = orders();
    let types = classify(&ds);
    let view = apply(&ds, &types, &[FilterPredicate::categorical_in("region", ["north"])]).unwrap();
    let report = summarize(&view, &types, 20).unwrap();

    assert_eq!(report.row_count, 4);
    let kinds: Vec<ColumnType> = report.columns.iter().map(|c| c.summary.kind()).collect();
    assert_eq!(
        kinds,
        vec![ColumnType::Numeric, ColumnType::Categorical, ColumnType::Datetime]
    );

    let ColumnSummary::Numeric(amount) = &report.get("amount").unwrap().summary else {
        panic!("amount should be numeric");
    };
    assert_eq!(amount.count, 3);
    assert_eq!(amount.missing_pct, 25.0);

    let ColumnSummary::Datetime(ordered) = &report.get("ordered").unwrap().summary else {
        panic!("ordered should be datetime");
    };
    assert_eq!(ordered.date_range, "2024-03-01 to 2024-03-07");
    let days: Vec<String> = report
        .get("ordered")
        .unwrap()
        .chart
        .points
        .iter()
        .map(|p| match &p.bucket {
            ChartBucket::Day(d) => d.to_string(),
            other => panic!("unexpected bucket {other:?}"),
        })
        .collect();
    assert_eq!(days, vec!["2024-03-01", "2024-03-03", "2024-03-05", "2024-03-07"]);
}

#[test]
fn all_missing_column_does_not_fail() {
    let ds = Dataset::new(vec![
        Column::new("x", vec![CellValue::Null, CellValue::Float(f64::NAN)]),
        Column::with_storage(
            "y",
            csvdash::data::StorageType::Float,
            vec![CellValue::Null, CellValue::Null],
        ),
    ])
    .unwrap();
    let types = classify(&ds);
    let report = summarize(&ds, &types, 20).unwrap();
    assert!(report.get("x").is_none());
    assert!(report.get("y").is_none());
}

#[test]
fn zero_top_k_is_rejected() {
    let ds = orders();
    let types = classify(&ds);
    assert!(matches!(
        summarize(&ds, &types, 0),
        Err(CoreError::InvalidConfig(_))
    ));
}
