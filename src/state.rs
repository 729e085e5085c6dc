use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use csvdash::config::DashboardConfig;
use csvdash::data::datetime::parse_cell;
use csvdash::data::filter::filtered_indices;
use csvdash::data::summary::value_counts;
use csvdash::data::{
    classify, summarize_with, ColumnType, Dataset, FilterPredicate, FilterState, SummaryReport, TypeMap,
    SELECT_ALL,
};
use csvdash::export;
use csvdash::format::FileInfo;

// ---------------------------------------------------------------------------
// Filter controls – widget state that turns into predicates
// ---------------------------------------------------------------------------

/// Min/max slider pair over a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericControl {
    pub column: String,
    pub bounds: (f64, f64),
    pub selected: (f64, f64),
}

/// Start/end date pickers over a datetime column.
#[derive(Debug, Clone, PartialEq)]
pub struct DateControl {
    pub column: String,
    pub bounds: (NaiveDate, NaiveDate),
    pub selected: (NaiveDate, NaiveDate),
}

/// Checklist over the values of a categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryControl {
    pub column: String,
    /// Sorted values, or the most frequent ones when there are too many.
    pub choices: Vec<String>,
    /// Contains [`SELECT_ALL`] while the column is unfiltered.
    pub selected: BTreeSet<String>,
}

impl CategoryControl {
    pub fn is_all(&self) -> bool {
        self.selected.contains(SELECT_ALL)
    }

    pub fn toggle(&mut self, value: &str) {
        if value == SELECT_ALL {
            self.selected.clear();
            self.selected.insert(SELECT_ALL.to_string());
            return;
        }
        self.selected.remove(SELECT_ALL);
        if !self.selected.remove(value) {
            self.selected.insert(value.to_string());
        }
        if self.selected.is_empty() {
            self.selected.insert(SELECT_ALL.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterControls {
    pub text: String,
    pub numeric: Vec<NumericControl>,
    pub dates: Vec<DateControl>,
    pub categories: Vec<CategoryControl>,
}

impl FilterControls {
    /// One control per numeric, datetime and categorical column, each
    /// initialised to its full range.
    pub fn build(dataset: &Dataset, types: &TypeMap, max_choices: usize) -> Self {
        let mut controls = FilterControls::default();

        for name in types.columns_of(ColumnType::Numeric) {
            let Some(col) = dataset.column(name) else { continue };
            let values: Vec<f64> = col.present().filter_map(|v| v.as_f64()).collect();
            if values.is_empty() {
                continue;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            controls.numeric.push(NumericControl {
                column: name.to_string(),
                bounds: (min, max),
                selected: (min, max),
            });
        }

        for name in types.columns_of(ColumnType::Datetime) {
            let Some(col) = dataset.column(name) else { continue };
            let parsed: Option<Vec<NaiveDate>> = col.present().map(|v| parse_cell(v).map(|dt| dt.date())).collect();
            let Some(days) = parsed else {
                log::debug!("no date filter for '{name}': unparseable values");
                continue;
            };
            let (Some(first), Some(last)) = (days.iter().min().copied(), days.iter().max().copied()) else {
                continue;
            };
            controls.dates.push(DateControl {
                column: name.to_string(),
                bounds: (first, last),
                selected: (first, last),
            });
        }

        for name in types.columns_of(ColumnType::Categorical) {
            let Some(col) = dataset.column(name) else { continue };
            let counts = value_counts(col);
            let mut choices: Vec<String> = counts.into_iter().take(max_choices).map(|(v, _)| v).collect();
            if col.distinct_count() <= max_choices {
                choices.sort();
            }
            controls.categories.push(CategoryControl {
                column: name.to_string(),
                choices,
                selected: BTreeSet::from([SELECT_ALL.to_string()]),
            });
        }

        controls
    }

    /// Predicates for every control narrowed away from its full range.
    pub fn predicates(&self) -> FilterState {
        let mut state = FilterState::new();
        if !self.text.trim().is_empty() {
            state.push(FilterPredicate::text_search(self.text.trim()));
        }
        for c in &self.numeric {
            if c.selected != c.bounds {
                state.push(FilterPredicate::numeric_range(&c.column, c.selected.0, c.selected.1));
            }
        }
        for c in &self.dates {
            if c.selected != c.bounds {
                state.push(FilterPredicate::date_range(
                    &c.column,
                    c.selected.0.format("%Y-%m-%d").to_string(),
                    format!("{} 23:59:59.999999999", c.selected.1.format("%Y-%m-%d")),
                ));
            }
        }
        for c in &self.categories {
            if !c.is_all() {
                state.push(FilterPredicate::categorical_in(&c.column, c.selected.iter().cloned()));
            }
        }
        state
    }

    pub fn reset(&mut self) {
        self.text.clear();
        for c in &mut self.numeric {
            c.selected = c.bounds;
        }
        for c in &mut self.dates {
            c.selected = c.bounds;
        }
        for c in &mut self.categories {
            c.selected = BTreeSet::from([SELECT_ALL.to_string()]);
        }
    }
}

// ---------------------------------------------------------------------------
// Session – the full UI state, independent of rendering
// ---------------------------------------------------------------------------

/// A loaded file with its column types, fixed for the session.
pub struct LoadedSource {
    pub path: PathBuf,
    pub dataset: Dataset,
    pub types: TypeMap,
}

/// The filtered view currently on screen.
pub struct View {
    pub filters: FilterState,
    pub dataset: Dataset,
    pub report: SummaryReport,
}

pub struct Session {
    pub config: DashboardConfig,

    /// Loaded dataset (None until user loads a file).
    pub source: Option<LoadedSource>,

    pub controls: FilterControls,

    /// Recomputed by [`Session::refilter`] after every control change.
    pub view: Option<View>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            source: None,
            controls: FilterControls::default(),
            view: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset: classify it, build controls, summarize.
    pub fn set_dataset(&mut self, path: &Path, dataset: Dataset) {
        if dataset.len() > self.config.large_dataset_threshold {
            log::warn!(
                "Large dataset ({} rows); filtering and charts may be slow",
                dataset.len()
            );
        }
        let types = classify(&dataset);
        log::info!(
            "Classified {} columns: {} numeric, {} categorical, {} datetime, {} text",
            types.len(),
            types.count_of(ColumnType::Numeric),
            types.count_of(ColumnType::Categorical),
            types.count_of(ColumnType::Datetime),
            types.count_of(ColumnType::Text)
        );

        self.controls = FilterControls::build(&dataset, &types, self.config.max_filter_choices);
        self.source = Some(LoadedSource {
            path: path.to_path_buf(),
            dataset,
            types,
        });
        self.status_message = None;
        self.refilter();
    }

    pub fn predicates(&self) -> FilterState {
        self.controls.predicates()
    }

    /// Recompute the filtered view and its summaries from the controls.
    pub fn refilter(&mut self) {
        let Some(src) = &self.source else {
            self.view = None;
            return;
        };
        let filters = self.predicates();
        match self.compute_view(src, filters) {
            Ok(view) => self.view = Some(view),
            Err(e) => {
                log::error!("Failed to refresh view: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    fn compute_view(&self, src: &LoadedSource, filters: FilterState) -> Result<View> {
        let rows = filtered_indices(&src.dataset, &src.types, filters.predicates())?;
        let dataset = src.dataset.take_rows(&rows);
        let report = summarize_with(&dataset, &src.types, &self.config.summary_options())?;
        Ok(View {
            filters,
            dataset,
            report,
        })
    }

    pub fn reset_filters(&mut self) {
        self.controls.reset();
        self.refilter();
    }

    /// "`file`: N rows × M columns · showing K rows" line for the info header.
    pub fn info_text(&self) -> Option<String> {
        let src = self.source.as_ref()?;
        let shown = self.view.as_ref().map_or(0, |v| v.dataset.len());
        Some(format!(
            "{} · showing {} of {} rows",
            FileInfo::new(&src.path, &src.dataset),
            shown,
            src.dataset.len()
        ))
    }

    pub fn export_html(&self, path: &Path) -> Result<()> {
        let src = self.source.as_ref().context("No dataset loaded")?;
        let view = self.view.as_ref().context("No view to export")?;
        export::export_html(
            path,
            &self.config.title,
            &view.dataset,
            &src.types,
            &view.filters,
            &view.report,
        )
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let view = self.view.as_ref().context("No view to export")?;
        export::export_csv(path, &view.dataset)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}
