use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints};

use csvdash::data::summary::{ChartBucket, ChartKind, ChartSeries, ColumnReport, ColumnSummary};
use csvdash::data::{ColumnType, Dataset};
use csvdash::format::{format_number, format_pct};

use crate::color::ColorMap;
use crate::state::Session;

const HISTOGRAM_COLOR: Color32 = Color32::from_rgb(76, 120, 168);

// ---------------------------------------------------------------------------
// Central panel – dataset info, statistics, charts and preview
// ---------------------------------------------------------------------------

pub fn dashboard(ui: &mut Ui, session: &Session) {
    let (Some(src), Some(view)) = (&session.source, &session.view) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to build a dashboard  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(&session.config.title);
            if let Some(info) = session.info_text() {
                ui.label(info);
            }
            let counts: Vec<String> = [
                ColumnType::Numeric,
                ColumnType::Categorical,
                ColumnType::Datetime,
                ColumnType::Boolean,
                ColumnType::Text,
            ]
            .iter()
            .map(|&kind| format!("{}: {}", kind.label(), src.types.count_of(kind)))
            .collect();
            ui.label(RichText::new(counts.join("  ·  ")).weak());
            ui.separator();

            if view.report.is_empty() {
                ui.label("No rows match the current filters.");
            }

            let height = session.config.chart_height;
            for kind in [ColumnType::Numeric, ColumnType::Categorical, ColumnType::Datetime] {
                let columns: Vec<&ColumnReport> = view.report.of_kind(kind).collect();
                if columns.is_empty() {
                    continue;
                }
                ui.heading(match kind {
                    ColumnType::Numeric => "Numeric columns",
                    ColumnType::Categorical => "Categorical columns",
                    _ => "Datetime columns",
                });
                stats_grid(ui, kind, &columns);
                for column in columns {
                    egui::CollapsingHeader::new(RichText::new(&column.column).strong())
                        .id_salt(format!("chart_{}", column.column))
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            chart(ui, &column.column, &column.chart, height);
                        });
                }
                ui.separator();
            }

            let preview_rows = view.dataset.len().min(session.config.max_preview_rows);
            egui::CollapsingHeader::new(RichText::new(format!("Data preview (first {preview_rows} rows)")).strong())
                .id_salt("data_preview")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    data_preview(ui, &view.dataset, preview_rows);
                });
        });
}

// ---------------------------------------------------------------------------
// Statistics grid
// ---------------------------------------------------------------------------

fn stats_grid(ui: &mut Ui, kind: ColumnType, columns: &[&ColumnReport]) {
    let headers: &[&str] = match kind {
        ColumnType::Numeric => &["Column", "Count", "Mean", "Std", "Min", "Median", "95th pct", "Max", "Missing"],
        ColumnType::Categorical => &["Column", "Unique", "Most common", "Count", "Others", "Missing"],
        _ => &["Column", "First", "Last", "Range", "Records", "Missing"],
    };

    egui::Grid::new(format!("stats_{}", kind.label()))
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for h in headers {
                ui.strong(*h);
            }
            ui.end_row();

            for column in columns {
                for cell in stats_row(column) {
                    ui.label(cell);
                }
                ui.end_row();
            }
        });
}

fn stats_row(column: &ColumnReport) -> Vec<String> {
    let mut row = vec![column.column.clone()];
    match &column.summary {
        ColumnSummary::Numeric(s) => row.extend([
            s.count.to_string(),
            format_number(s.mean, 2),
            s.std_dev.map_or_else(|| "–".to_string(), |v| format_number(v, 2)),
            format_number(s.min, 2),
            format_number(s.median, 2),
            format_number(s.p95, 2),
            format_number(s.max, 2),
        ]),
        ColumnSummary::Categorical(s) => row.extend([
            s.distinct.to_string(),
            s.most_common.clone().unwrap_or_default(),
            s.most_common_count.to_string(),
            s.others_count.to_string(),
        ]),
        ColumnSummary::Datetime(s) => row.extend([
            s.first.format("%Y-%m-%d %H:%M").to_string(),
            s.last.format("%Y-%m-%d %H:%M").to_string(),
            s.date_range.clone(),
            s.total_records.to_string(),
        ]),
    }
    row.push(format_pct(column.summary.missing_pct()));
    row
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Draw one chart series: histogram and categorical bars as a `BarChart`,
/// daily counts as a `Line` over a date axis.
fn chart(ui: &mut Ui, name: &str, series: &ChartSeries, height: f32) {
    if series.is_empty() {
        ui.label("—");
        return;
    }

    let plot = Plot::new(format!("plot_{name}"))
        .height(height)
        .allow_scroll(false)
        .allow_drag(false)
        .y_axis_label("Count");

    match series.kind {
        ChartKind::Histogram => {
            let bars: Vec<Bar> = series
                .points
                .iter()
                .filter_map(|p| match p.bucket {
                    ChartBucket::Range { start, end } => {
                        let width = if end > start { end - start } else { 1.0 };
                        Some(
                            Bar::new((start + end) / 2.0, p.value)
                                .width(width)
                                .name(p.bucket.to_string()),
                        )
                    }
                    _ => None,
                })
                .collect();
            let chart = BarChart::new(bars).name(name).color(HISTOGRAM_COLOR);
            plot.x_axis_label(name).show(ui, |plot_ui| plot_ui.bar_chart(chart));
        }
        ChartKind::Bar => {
            let labels: Vec<String> = series.points.iter().map(|p| p.bucket.to_string()).collect();
            let colors = ColorMap::new(labels.iter().map(String::as_str));
            let bars: Vec<Bar> = series
                .points
                .iter()
                .zip(&labels)
                .enumerate()
                .map(|(i, (p, label))| {
                    Bar::new(i as f64, p.value)
                        .width(0.8)
                        .name(label)
                        .fill(colors.color_for(label))
                })
                .collect();
            let chart = BarChart::new(bars).name(name);
            plot.x_axis_formatter(move |mark: GridMark, _range| category_label(&labels, mark.value))
                .show(ui, |plot_ui| plot_ui.bar_chart(chart));
        }
        ChartKind::Line => {
            let points: PlotPoints = series
                .points
                .iter()
                .filter_map(|p| match p.bucket {
                    ChartBucket::Day(day) => Some([f64::from(day.num_days_from_ce()), p.value]),
                    _ => None,
                })
                .collect();
            let line = Line::new(points).name(name).width(2.0);
            plot.x_axis_formatter(|mark: GridMark, _range| day_label(mark.value))
                .show(ui, |plot_ui| plot_ui.line(line));
        }
    }
}

fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

fn day_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Data preview
// ---------------------------------------------------------------------------

fn data_preview(ui: &mut Ui, dataset: &Dataset, rows: usize) {
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0), dataset.width())
            .header(20.0, |mut header| {
                for name in dataset.column_names() {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows, |mut row| {
                    let index = row.index();
                    for cell in dataset.row(index) {
                        row.col(|ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_axis_labels_only_on_integers() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 7.0), "");
    }

    #[test]
    fn day_axis_round_trips_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(day_label(f64::from(day.num_days_from_ce())), "2024-03-09");
    }
}
