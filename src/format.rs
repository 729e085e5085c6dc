use std::path::Path;

use crate::data::Dataset;

/// Compact number rendering used by the dashboard metrics and the HTML report:
/// `1.23M`, `4.56K`, `7.89`.
pub fn format_number(num: f64, precision: usize) -> String {
    if !num.is_finite() {
        return num.to_string();
    }
    let abs = num.abs();
    if abs >= 1e6 {
        format!("{:.precision$}M", num / 1e6)
    } else if abs >= 1e3 {
        format!("{:.precision$}K", num / 1e3)
    } else {
        format!("{num:.precision$}")
    }
}

/// Percentage with one decimal, as shown next to missing-value counts.
pub fn format_pct(pct: f64) -> String {
    format!("{pct:.1}%")
}

/// Header line describing a loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

impl FileInfo {
    pub fn new(path: &Path, dataset: &Dataset) -> Self {
        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            rows: dataset.len(),
            columns: dataset.width(),
        }
    }
}

impl std::fmt::Display for FileInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} rows × {} columns",
            self.name,
            format_number(self.rows as f64, 0),
            self.columns
        )
    }
}
