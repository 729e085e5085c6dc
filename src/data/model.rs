use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Used as a key in ordered and hashed sets, so it carries manual `Ord`/`Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

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
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
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
            CellValue::Bool(b) => b.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Null => {}
        }
    }
}

/// The string representation used by text search, categorical membership
/// and CSV export.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    /// `Null` and NaN floats count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Try to interpret the value as an `f64` for numeric statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// StorageType – the physical representation of a column
// ---------------------------------------------------------------------------

/// How a column is stored, decided once at load time (the dataframe "dtype").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

impl StorageType {
    pub fn is_numeric(self) -> bool {
        matches!(self, StorageType::Integer | StorageType::Float)
    }

    /// Infer the storage from the non-missing cells.
    ///
    /// A column without any observed value is stored as text.
    pub fn infer(values: &[CellValue]) -> Self {
        let mut observed = values.iter().filter(|v| !v.is_missing()).peekable();
        if observed.peek().is_none() {
            return StorageType::Text;
        }

        let mut storage: Option<StorageType> = None;
        for value in observed {
            let cell = match value {
                CellValue::Integer(_) => StorageType::Integer,
                CellValue::Float(_) => StorageType::Float,
                CellValue::Bool(_) => StorageType::Boolean,
                CellValue::DateTime(_) => StorageType::DateTime,
                CellValue::Text(_) | CellValue::Null => return StorageType::Text,
            };
            storage = Some(match (storage, cell) {
                (None, s) => s,
                (Some(a), b) if a == b => a,
                (Some(a), b) if a.is_numeric() && b.is_numeric() => StorageType::Float,
                _ => return StorageType::Text,
            });
        }
        storage.unwrap_or(StorageType::Text)
    }
}

// ---------------------------------------------------------------------------
// Column – a named, typed sequence of cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub storage: StorageType,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Build a column, inferring its storage from the values.
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let storage = StorageType::infer(&values);
        Self::with_storage(name, storage, values)
    }

    /// Build a column whose storage is already known (e.g. from a file schema).
    pub fn with_storage(name: impl Into<String>, storage: StorageType, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            storage,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the non-missing cells.
    pub fn present(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        self.present().collect::<HashSet<_>>().len()
    }

    fn take(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            storage: self.storage,
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete in-memory table
// ---------------------------------------------------------------------------

/// An ordered set of uniquely named, equally long columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Assemble a dataset, rejecting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> CoreResult<Self> {
        let n_rows = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CoreError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != n_rows {
                return Err(CoreError::RaggedColumn {
                    column: column.name.clone(),
                    expected: n_rows,
                    found: column.len(),
                });
            }
        }
        Ok(Dataset { columns, n_rows })
    }

    /// Build a dataset from row-major records; storage is inferred per column.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<CellValue>>) -> CoreResult<Self> {
        let mut values: Vec<Vec<CellValue>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(CoreError::RaggedRow {
                    row: row_no,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
            for (slot, cell) in values.iter_mut().zip(row) {
                slot.push(cell);
            }
        }
        let columns = headers
            .iter()
            .zip(values)
            .map(|(name, vals)| Column::new(name.clone(), vals))
            .collect();
        Dataset::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.columns.iter().map(move |c| &c.values[index])
    }

    /// A new dataset holding only `rows`, in the order given.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        let rows: Vec<usize> = (0..self.n_rows.min(n)).collect();
        self.take_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_follows_observed_values() {
        let ints = vec![CellValue::Integer(1), CellValue::Null, CellValue::Integer(3)];
        assert_eq!(StorageType::infer(&ints), StorageType::Integer);

        let mixed = vec![CellValue::Integer(1), CellValue::Float(2.5)];
        assert_eq!(StorageType::infer(&mixed), StorageType::Float);

        let bools = vec![CellValue::Bool(true), CellValue::Null];
        assert_eq!(StorageType::infer(&bools), StorageType::Boolean);

        let text = vec![CellValue::Integer(1), CellValue::from("x")];
        assert_eq!(StorageType::infer(&text), StorageType::Text);

        let empty = vec![CellValue::Null, CellValue::Float(f64::NAN)];
        assert_eq!(StorageType::infer(&empty), StorageType::Text);
    }

    #[test]
    fn nan_counts_as_missing() {
        assert!(CellValue::Float(f64::NAN).is_missing());
        assert!(CellValue::Null.is_missing());
        assert!(!CellValue::Float(0.0).is_missing());
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
    }

    #[test]
    fn rejects_duplicate_and_ragged_columns() {
        let a = Column::new("a", vec![CellValue::Integer(1)]);
        let dup = Dataset::new(vec![a.clone(), a.clone()]);
        assert_eq!(dup, Err(CoreError::DuplicateColumn("a".into())));

        let b = Column::new("b", vec![CellValue::Integer(1), CellValue::Integer(2)]);
        let ragged = Dataset::new(vec![a, b]);
        assert!(matches!(ragged, Err(CoreError::RaggedColumn { found: 2, .. })));
    }

    #[test]
    fn take_rows_preserves_order_and_columns() {
        let headers = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            vec![CellValue::Integer(1), "a".into()],
            vec![CellValue::Integer(2), "b".into()],
            vec![CellValue::Integer(3), "c".into()],
        ];
        let ds = Dataset::from_rows(&headers, rows).unwrap();
        let sub = ds.take_rows(&[0, 2]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.column_names(), vec!["id", "name"]);
        let ids: Vec<_> = sub.column("id").unwrap().values.clone();
        assert_eq!(ids, vec![CellValue::Integer(1), CellValue::Integer(3)]);
        assert_eq!(ds.head(1).len(), 1);
    }
}
