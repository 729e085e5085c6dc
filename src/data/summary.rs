use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::datetime::parse_cell;
use super::model::{Column, Dataset};
use super::stats;
use super::types::{ColumnType, TypeMap};
use crate::error::{CoreError, CoreResult};

pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
/// Label of the bucket aggregating categories beyond the top-K.
pub const OTHERS_LABEL: &str = "Others";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Categories shown individually before bucketing the rest into "Others".
    pub top_k: usize,
    /// Bucket count of numeric histograms.
    pub histogram_bins: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl SummaryOptions {
    pub fn validate(&self) -> CoreResult<()> {
        if self.top_k == 0 {
            return Err(CoreError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.histogram_bins == 0 {
            return Err(CoreError::InvalidConfig(
                "histogram_bins must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Summary records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; absent with fewer than two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub median: f64,
    pub p95: f64,
    pub max: f64,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub distinct: usize,
    pub most_common: Option<String>,
    pub most_common_count: usize,
    /// Occurrences of every value outside the top-K.
    pub others_count: usize,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatetimeSummary {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    /// `"YYYY-MM-DD to YYYY-MM-DD"`.
    pub date_range: String,
    pub total_records: usize,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
    Datetime(DatetimeSummary),
}

impl ColumnSummary {
    pub fn kind(&self) -> ColumnType {
        match self {
            ColumnSummary::Numeric(_) => ColumnType::Numeric,
            ColumnSummary::Categorical(_) => ColumnType::Categorical,
            ColumnSummary::Datetime(_) => ColumnType::Datetime,
        }
    }

    pub fn missing_pct(&self) -> f64 {
        match self {
            ColumnSummary::Numeric(s) => s.missing_pct,
            ColumnSummary::Categorical(s) => s.missing_pct,
            ColumnSummary::Datetime(s) => s.missing_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Histogram,
    Bar,
    Line,
}

/// The x-axis position of one chart point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartBucket {
    Range { start: f64, end: f64 },
    Category(String),
    Day(NaiveDate),
}

impl fmt::Display for ChartBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartBucket::Range { start, end } => write!(f, "{start:.2}..{end:.2}"),
            ChartBucket::Category(label) => write!(f, "{label}"),
            ChartBucket::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub bucket: ChartBucket,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.value).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub summary: ColumnSummary,
    pub chart: ChartSeries,
}

/// Summaries of one (filtered) view: numeric columns first, then categorical,
/// then datetime, each group in dataset column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryReport {
    pub row_count: usize,
    pub columns: Vec<ColumnReport>,
}

impl SummaryReport {
    pub fn get(&self, column: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn of_kind(&self, kind: ColumnType) -> impl Iterator<Item = &ColumnReport> {
        self.columns.iter().filter(move |c| c.summary.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

// ---------------------------------------------------------------------------
// Summarization
// ---------------------------------------------------------------------------

/// Summarize every numeric, categorical and datetime column of `dataset`
/// with the default histogram size.
pub fn summarize(dataset: &Dataset, types: &TypeMap, top_k: usize) -> CoreResult<SummaryReport> {
    summarize_with(
        dataset,
        types,
        &SummaryOptions {
            top_k,
            ..SummaryOptions::default()
        },
    )
}

/// Like [`summarize`] with explicit options.
///
/// A column whose values cannot be summarized (nothing observed, dates that
/// do not parse) is left out of the report; it never fails the whole call.
pub fn summarize_with(dataset: &Dataset, types: &TypeMap, options: &SummaryOptions) -> CoreResult<SummaryReport> {
    options.validate()?;
    types.validate(dataset)?;

    let mut report = SummaryReport {
        row_count: dataset.len(),
        columns: Vec::new(),
    };
    if dataset.is_empty() {
        return Ok(report);
    }

    let groups = [ColumnType::Numeric, ColumnType::Categorical, ColumnType::Datetime];
    for kind in groups {
        for name in types.columns_of(kind) {
            let Some(column) = dataset.column(name) else {
                continue;
            };
            let result = match kind {
                ColumnType::Numeric => summarize_numeric(column, dataset.len(), options.histogram_bins),
                ColumnType::Categorical => Ok(summarize_categorical(column, dataset.len(), options.top_k)),
                ColumnType::Datetime => summarize_datetime(column, dataset.len()),
                ColumnType::Boolean | ColumnType::Text => continue,
            };
            match result {
                Ok((summary, chart)) => report.columns.push(ColumnReport {
                    column: name.to_string(),
                    summary,
                    chart,
                }),
                Err(e) => log::debug!("column '{name}' left out of the summary: {e}"),
            }
        }
    }
    Ok(report)
}

fn missing_pct(column: &Column, n_rows: usize) -> f64 {
    column.missing_count() as f64 / n_rows as f64 * 100.0
}

fn summarize_numeric(column: &Column, n_rows: usize, bins: usize) -> CoreResult<(ColumnSummary, ChartSeries)> {
    let mut values: Vec<f64> = column.values.iter().filter_map(|v| v.as_f64()).collect();
    if values.is_empty() {
        return Err(CoreError::NoObservations(column.name.clone()));
    }
    values.sort_by(f64::total_cmp);

    let no_values = || CoreError::NoObservations(column.name.clone());
    let summary = NumericSummary {
        count: values.len(),
        mean: stats::mean(&values).ok_or_else(no_values)?,
        std_dev: stats::std_dev(&values),
        min: values[0],
        median: stats::quantile_sorted(&values, 0.5).ok_or_else(no_values)?,
        p95: stats::quantile_sorted(&values, 0.95).ok_or_else(no_values)?,
        max: values[values.len() - 1],
        missing_pct: missing_pct(column, n_rows),
    };

    let points = stats::histogram(&values, bins)
        .into_iter()
        .map(|bin| ChartPoint {
            bucket: ChartBucket::Range {
                start: bin.start,
                end: bin.end,
            },
            value: bin.count as f64,
        })
        .collect();

    Ok((
        ColumnSummary::Numeric(summary),
        ChartSeries {
            kind: ChartKind::Histogram,
            points,
        },
    ))
}

/// Value counts ordered by count descending, then value ascending.
pub fn value_counts(column: &Column) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in column.present() {
        *counts.entry(value.to_string()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn summarize_categorical(column: &Column, n_rows: usize, top_k: usize) -> (ColumnSummary, ChartSeries) {
    let counts = value_counts(column);
    let others_count: usize = counts.iter().skip(top_k).map(|(_, n)| n).sum();

    let summary = CategoricalSummary {
        distinct: counts.len(),
        most_common: counts.first().map(|(v, _)| v.clone()),
        most_common_count: counts.first().map_or(0, |(_, n)| *n),
        others_count,
        missing_pct: missing_pct(column, n_rows),
    };

    let mut points: Vec<ChartPoint> = counts
        .into_iter()
        .take(top_k)
        .map(|(label, n)| ChartPoint {
            bucket: ChartBucket::Category(label),
            value: n as f64,
        })
        .collect();
    if others_count > 0 {
        points.push(ChartPoint {
            bucket: ChartBucket::Category(OTHERS_LABEL.to_string()),
            value: others_count as f64,
        });
    }

    (
        ColumnSummary::Categorical(summary),
        ChartSeries {
            kind: ChartKind::Bar,
            points,
        },
    )
}

fn summarize_datetime(column: &Column, n_rows: usize) -> CoreResult<(ColumnSummary, ChartSeries)> {
    let mut parsed = Vec::with_capacity(column.len());
    for value in column.present() {
        let dt = parse_cell(value).ok_or_else(|| CoreError::ParseFailure {
            column: column.name.clone(),
            value: value.to_string(),
            expected: "a date",
        })?;
        parsed.push(dt);
    }

    let (Some(first), Some(last)) = (parsed.iter().min().copied(), parsed.iter().max().copied()) else {
        return Err(CoreError::NoObservations(column.name.clone()));
    };

    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for dt in &parsed {
        *daily.entry(dt.date()).or_default() += 1;
    }

    let summary = DatetimeSummary {
        first,
        last,
        date_range: format!("{} to {}", first.date(), last.date()),
        total_records: parsed.len(),
        missing_pct: missing_pct(column, n_rows),
    };
    let points = daily
        .into_iter()
        .map(|(day, n)| ChartPoint {
            bucket: ChartBucket::Day(day),
            value: n as f64,
        })
        .collect();

    Ok((
        ColumnSummary::Datetime(summary),
        ChartSeries {
            kind: ChartKind::Line,
            points,
        },
    ))
}
