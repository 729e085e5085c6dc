use std::fmt;

use serde::{Deserialize, Serialize};

use super::datetime::parse_cell;
use super::model::{Column, Dataset, StorageType};
use crate::error::{CoreError, CoreResult};

/// How many non-missing values are sampled when checking a text column for dates.
pub const DATE_SAMPLE_SIZE: usize = 100;
/// Upper bound on distinct values for a text column to count as categorical.
pub const MAX_CATEGORIES: usize = 50;
/// Distinct values must stay below this share of the row count to be categorical.
pub const CATEGORY_RATIO: f64 = 0.5;

// ---------------------------------------------------------------------------
// ColumnType – the semantic classification of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
    Text,
}

impl ColumnType {
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
        }
    }

    /// Whether global text search looks at columns of this type.
    pub fn is_searchable(self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Categorical)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// TypeMap – column name → ColumnType, in dataset column order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeMap {
    entries: Vec<(String, ColumnType)>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type of `column`, replacing an existing entry in place.
    pub fn insert(&mut self, column: impl Into<String>, kind: ColumnType) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = kind,
            None => self.entries.push((column, kind)),
        }
    }

    pub fn get(&self, column: &str) -> Option<ColumnType> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Names of the columns classified as `kind`, in order.
    pub fn columns_of(&self, kind: ColumnType) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, k)| *k == kind)
            .map(|(name, _)| name)
    }

    pub fn count_of(&self, kind: ColumnType) -> usize {
        self.columns_of(kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that the map covers exactly the columns of `dataset`.
    pub fn validate(&self, dataset: &Dataset) -> CoreResult<()> {
        if let Some((name, _)) = self
            .entries
            .iter()
            .find(|(name, _)| dataset.column(name).is_none())
        {
            return Err(CoreError::UnknownColumn(name.clone()));
        }
        if let Some(column) = dataset.columns().iter().find(|c| self.get(&c.name).is_none()) {
            return Err(CoreError::UntypedColumn(column.name.clone()));
        }
        Ok(())
    }
}

impl FromIterator<(String, ColumnType)> for TypeMap {
    fn from_iter<I: IntoIterator<Item = (String, ColumnType)>>(iter: I) -> Self {
        let mut map = TypeMap::new();
        for (name, kind) in iter {
            map.insert(name, kind);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Assign one semantic type to every column of `dataset`.
///
/// Text columns are checked for dates on a sample of at most
/// [`DATE_SAMPLE_SIZE`] non-missing values, so a rare malformed value further
/// down a large column does not change the outcome.
pub fn classify(dataset: &Dataset) -> TypeMap {
    dataset
        .columns()
        .iter()
        .map(|column| {
            let kind = classify_column(column, dataset.len());
            log::debug!("column '{}' classified as {kind}", column.name);
            (column.name.clone(), kind)
        })
        .collect()
}

fn classify_column(column: &Column, n_rows: usize) -> ColumnType {
    match column.storage {
        StorageType::Text if sample_parses_as_dates(column) => ColumnType::Datetime,
        StorageType::Boolean => ColumnType::Boolean,
        StorageType::Integer | StorageType::Float => ColumnType::Numeric,
        StorageType::DateTime => ColumnType::Datetime,
        StorageType::Text => {
            let distinct = column.distinct_count();
            if distinct > 0
                && distinct <= MAX_CATEGORIES
                && (distinct as f64) < CATEGORY_RATIO * n_rows as f64
            {
                ColumnType::Categorical
            } else {
                ColumnType::Text
            }
        }
    }
}

fn sample_parses_as_dates(column: &Column) -> bool {
    let mut sample = column.present().take(DATE_SAMPLE_SIZE).peekable();
    sample.peek().is_some() && sample.all(|v| parse_cell(v).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn text_column(name: &str, values: &[&str]) -> Column {
        Column::new(name, values.iter().map(|v| CellValue::from(*v)).collect())
    }

    #[test]
    fn detects_dates_in_text() {
        let col = text_column("when", &["2024-01-01", "2024-01-02", "2024-02-10"]);
        let ds = Dataset::new(vec![col]).unwrap();
        assert_eq!(classify(&ds).get("when"), Some(ColumnType::Datetime));
    }

    #[test]
    fn year_month_text_is_datetime() {
        let months: Vec<String> = (1..=8).map(|m| format!("2024-{m:02}")).collect();
        let months: Vec<&str> = months.iter().map(String::as_str).collect();
        let ds = Dataset::new(vec![text_column("month", &months)]).unwrap();
        assert_eq!(classify(&ds).get("month"), Some(ColumnType::Datetime));
    }

    #[test]
    fn one_bad_value_in_sample_means_not_dates() {
        let col = text_column("when", &["2024-01-01", "soon", "2024-02-10"]);
        let ds = Dataset::new(vec![col]).unwrap();
        assert_ne!(classify(&ds).get("when"), Some(ColumnType::Datetime));
    }

    #[test]
    fn bad_value_beyond_sample_is_not_seen() {
        let mut values: Vec<CellValue> = (0..DATE_SAMPLE_SIZE)
            .map(|i| CellValue::Text(format!("2024-01-{:02}", i % 28 + 1)))
            .collect();
        values.push(CellValue::from("not a date"));
        let ds = Dataset::new(vec![Column::new("when", values)]).unwrap();
        assert_eq!(classify(&ds).get("when"), Some(ColumnType::Datetime));
    }

    #[test]
    fn low_cardinality_text_is_categorical() {
        let values: Vec<&str> = ["red", "green", "blue"].iter().cycle().take(12).copied().collect();
        let ds = Dataset::new(vec![text_column("colour", &values)]).unwrap();
        assert_eq!(classify(&ds).get("colour"), Some(ColumnType::Categorical));
    }

    #[test]
    fn unique_text_is_text() {
        let ds = Dataset::new(vec![text_column("name", &["Alice", "Bob", "Charlie"])]).unwrap();
        assert_eq!(classify(&ds).get("name"), Some(ColumnType::Text));
    }

    #[test]
    fn more_than_fifty_categories_is_text() {
        let values: Vec<CellValue> = (0..200)
            .map(|i| CellValue::Text(format!("code-{}", i % 60)))
            .collect();
        let ds = Dataset::new(vec![Column::new("code", values)]).unwrap();
        assert_eq!(classify(&ds).get("code"), Some(ColumnType::Text));
    }

    #[test]
    fn numeric_boolean_and_missing_columns() {
        let ds = Dataset::new(vec![
            Column::new("n", vec![CellValue::Integer(1), CellValue::Float(2.5)]),
            Column::new("b", vec![CellValue::Bool(true), CellValue::Null]),
            Column::new("empty", vec![CellValue::Null, CellValue::Null]),
        ])
        .unwrap();
        let types = classify(&ds);
        assert_eq!(types.get("n"), Some(ColumnType::Numeric));
        assert_eq!(types.get("b"), Some(ColumnType::Boolean));
        assert_eq!(types.get("empty"), Some(ColumnType::Text));
    }

    #[test]
    fn classification_is_idempotent_and_ordered() {
        let ds = Dataset::new(vec![
            text_column("z", &["a", "a", "b", "b"]),
            Column::new("a", vec![CellValue::Integer(1); 4]),
        ])
        .unwrap();
        let first = classify(&ds);
        assert_eq!(first, classify(&ds));
        let names: Vec<&str> = first.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[test]
    fn validate_rejects_foreign_and_missing_entries() {
        let ds = Dataset::new(vec![text_column("a", &["x"])]).unwrap();
        let mut types = classify(&ds);
        assert!(types.validate(&ds).is_ok());

        types.insert("ghost", ColumnType::Numeric);
        assert_eq!(types.validate(&ds), Err(CoreError::UnknownColumn("ghost".into())));

        let empty = TypeMap::new();
        assert_eq!(empty.validate(&ds), Err(CoreError::UntypedColumn("a".into())));
    }
}
