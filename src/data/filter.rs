use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::datetime::{parse_cell, parse_datetime};
use super::model::{Column, Dataset};
use super::types::{ColumnType, TypeMap};
use crate::error::CoreResult;

/// Marker in a categorical selection meaning "do not filter this column".
pub const SELECT_ALL: &str = "All";

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// One filter condition. A predicate whose target column has a different
/// type than its kind expects is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterPredicate {
    /// Case-insensitive substring match over every text and categorical column.
    TextSearch { query: String },
    /// Inclusive numeric bounds; both must be present.
    NumericRange {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Inclusive date-time bounds given as text.
    DateRange {
        column: String,
        start: String,
        end: String,
    },
    /// Keep rows whose value is one of `allowed`.
    CategoricalIn { column: String, allowed: Vec<String> },
}

impl FilterPredicate {
    pub fn text_search(query: impl Into<String>) -> Self {
        FilterPredicate::TextSearch { query: query.into() }
    }

    pub fn numeric_range(column: impl Into<String>, min: f64, max: f64) -> Self {
        FilterPredicate::NumericRange {
            column: column.into(),
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn date_range(column: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        FilterPredicate::DateRange {
            column: column.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn categorical_in<S: Into<String>>(column: impl Into<String>, allowed: impl IntoIterator<Item = S>) -> Self {
        FilterPredicate::CategoricalIn {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Narrow `rows` to those satisfying this predicate.
    ///
    /// Returns `rows` unchanged when the predicate does not apply.
    fn narrow(&self, dataset: &Dataset, types: &TypeMap, rows: Vec<usize>) -> Vec<usize> {
        match self {
            FilterPredicate::TextSearch { query } => text_search(dataset, types, query, rows),
            FilterPredicate::NumericRange { column, min, max } => {
                let (Some(min), Some(max)) = (min, max) else {
                    return rows;
                };
                let Some(col) = typed_column(dataset, types, column, ColumnType::Numeric) else {
                    return rows;
                };
                rows.into_iter()
                    .filter(|&r| {
                        col.values[r]
                            .as_f64()
                            .is_some_and(|v| *min <= v && v <= *max)
                    })
                    .collect()
            }
            FilterPredicate::DateRange { column, start, end } => {
                let Some(col) = typed_column(dataset, types, column, ColumnType::Datetime) else {
                    return rows;
                };
                let (Some(start), Some(end)) = (parse_datetime(start), parse_datetime(end)) else {
                    log::debug!("date filter on '{column}' skipped: bounds '{start}'..'{end}' do not parse");
                    return rows;
                };
                // Whole column, not just `rows`: one bad value anywhere disables the predicate.
                let mut parsed = Vec::with_capacity(col.len());
                for value in &col.values {
                    if value.is_missing() {
                        parsed.push(None);
                        continue;
                    }
                    match parse_cell(value) {
                        Some(dt) => parsed.push(Some(dt)),
                        None => {
                            log::debug!("date filter on '{column}' skipped: '{value}' is not a date");
                            return rows;
                        }
                    }
                }
                rows.into_iter()
                    .filter(|&r| parsed[r].is_some_and(|dt| start <= dt && dt <= end))
                    .collect()
            }
            FilterPredicate::CategoricalIn { column, allowed } => {
                if allowed.is_empty() || allowed.iter().any(|a| a == SELECT_ALL) {
                    return rows;
                }
                let Some(col) = typed_column(dataset, types, column, ColumnType::Categorical) else {
                    return rows;
                };
                let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
                rows.into_iter()
                    .filter(|&r| {
                        let value = &col.values[r];
                        !value.is_missing() && allowed.contains(value.to_string().as_str())
                    })
                    .collect()
            }
        }
    }
}

fn typed_column<'a>(
    dataset: &'a Dataset,
    types: &TypeMap,
    column: &str,
    expected: ColumnType,
) -> Option<&'a Column> {
    if types.get(column) != Some(expected) {
        log::debug!("filter on '{column}' skipped: column is not {expected}");
        return None;
    }
    dataset.column(column)
}

fn text_search(dataset: &Dataset, types: &TypeMap, query: &str, rows: Vec<usize>) -> Vec<usize> {
    if query.trim().is_empty() {
        return rows;
    }
    let columns: Vec<_> = types
        .iter()
        .filter(|(_, kind)| kind.is_searchable())
        .filter_map(|(name, _)| dataset.column(name))
        .collect();
    if columns.is_empty() {
        return rows;
    }
    let needle = query.to_lowercase();
    rows.into_iter()
        .filter(|&r| {
            columns.iter().any(|col| {
                let value = &col.values[r];
                !value.is_missing() && value.to_string().to_lowercase().contains(&needle)
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// FilterState – the active predicates for one evaluation
// ---------------------------------------------------------------------------

/// Ordered set of active predicates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    predicates: Vec<FilterPredicate>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: FilterPredicate) {
        if !self.predicates.contains(&predicate) {
            self.predicates.push(predicate);
        }
    }

    pub fn with(mut self, predicate: FilterPredicate) -> Self {
        self.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }
}

impl FromIterator<FilterPredicate> for FilterState {
    fn from_iter<I: IntoIterator<Item = FilterPredicate>>(iter: I) -> Self {
        let mut state = FilterState::new();
        for predicate in iter {
            state.push(predicate);
        }
        state
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Return indices of rows that pass all predicates, in dataset order.
pub fn filtered_indices(
    dataset: &Dataset,
    types: &TypeMap,
    predicates: &[FilterPredicate],
) -> CoreResult<Vec<usize>> {
    types.validate(dataset)?;

    let mut rows: Vec<usize> = (0..dataset.len()).collect();
    for predicate in predicates {
        if rows.is_empty() {
            break;
        }
        rows = predicate.narrow(dataset, types, rows);
    }
    Ok(rows)
}

/// Apply `predicates` (logical AND) and materialise the matching rows as a
/// new dataset. The source is never modified.
pub fn apply(dataset: &Dataset, types: &TypeMap, predicates: &[FilterPredicate]) -> CoreResult<Dataset> {
    let rows = filtered_indices(dataset, types, predicates)?;
    log::debug!(
        "{} predicate(s) kept {} of {} rows",
        predicates.len(),
        rows.len(),
        dataset.len()
    );
    Ok(dataset.take_rows(&rows))
}
