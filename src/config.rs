use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::summary::{SummaryOptions, DEFAULT_HISTOGRAM_BINS, DEFAULT_TOP_K};
use crate::error::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Settings shared by the dashboard and the report exporter.
///
/// Loaded from a JSON file; every field is optional and falls back to its
/// default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    /// Categories charted individually before the "Others" bucket.
    pub top_k: usize,
    pub histogram_bins: usize,
    /// Rows shown in the data preview table.
    pub max_preview_rows: usize,
    /// Row count above which loading logs a performance warning.
    pub large_dataset_threshold: usize,
    pub chart_height: f32,
    /// Distinct values listed in a categorical filter checklist.
    pub max_filter_choices: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "CSV Dashboard".to_string(),
            top_k: DEFAULT_TOP_K,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            max_preview_rows: 200,
            large_dataset_threshold: 500_000,
            chart_height: 300.0,
            max_filter_choices: 20,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.summary_options().validate()?;
        if self.max_filter_choices == 0 {
            return Err(CoreError::InvalidConfig(
                "max_filter_choices must be at least 1".into(),
            ));
        }
        if self.chart_height.is_nan() || self.chart_height <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "chart_height must be positive, got {}",
                self.chart_height
            )));
        }
        Ok(())
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            top_k: self.top_k,
            histogram_bins: self.histogram_bins,
        }
    }
}
