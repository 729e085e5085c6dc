use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::summary::{ChartSeries, ColumnSummary};
use crate::data::{ColumnType, Dataset, FilterPredicate, FilterState, SummaryReport, TypeMap, SELECT_ALL};
use crate::format::{format_number, format_pct};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; }
        .header { border-bottom: 2px solid #333; padding-bottom: 10px; margin-bottom: 20px; }
        .section { margin: 20px 0; }
        .stats-table { border-collapse: collapse; width: 100%; margin: 10px 0; }
        .stats-table th, .stats-table td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        .stats-table th { background-color: #f2f2f2; }
        .chart { margin: 20px 0; }
        .bar-row { display: flex; align-items: center; font-size: 12px; margin: 2px 0; }
        .bar-label { width: 220px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
        .bar { height: 14px; background-color: #4c78a8; margin: 0 6px; }
        .filter-summary { background-color: #f9f9f9; padding: 10px; border-radius: 5px; margin: 10px 0; }
"#;

// ---------------------------------------------------------------------------
// HTML report
// ---------------------------------------------------------------------------

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `1234567` → `1,234,567`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Human-readable description of a predicate that actually narrows the view.
/// Predicates the filter engine would ignore are not described.
fn describe_predicate(predicate: &FilterPredicate, types: &TypeMap) -> Option<String> {
    match predicate {
        FilterPredicate::TextSearch { query } if !query.trim().is_empty() => {
            Some(format!("Text search: \"{}\"", query.trim()))
        }
        FilterPredicate::NumericRange {
            column,
            min: Some(min),
            max: Some(max),
        } if types.get(column) == Some(ColumnType::Numeric) => Some(format!("{column}: {min} to {max}")),
        FilterPredicate::DateRange { column, start, end } if types.get(column) == Some(ColumnType::Datetime) => {
            Some(format!("{column}: {start} to {end}"))
        }
        FilterPredicate::CategoricalIn { column, allowed }
            if types.get(column) == Some(ColumnType::Categorical)
                && !allowed.is_empty()
                && !allowed.iter().any(|v| v == SELECT_ALL) =>
        {
            Some(format!("{column}: {}", allowed.join(", ")))
        }
        _ => None,
    }
}

fn stats_table(out: &mut String, headers: &[&str], rows: Vec<Vec<String>>) {
    out.push_str("<table class=\"stats-table\"><thead><tr>");
    for h in headers {
        let _ = write!(out, "<th>{h}</th>");
    }
    out.push_str("</tr></thead><tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(&cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table>\n");
}

fn chart_block(out: &mut String, column: &str, chart: &ChartSeries) {
    if chart.is_empty() {
        return;
    }
    let max = chart.max_value();
    let _ = writeln!(out, "<div class=\"chart\"><h3>{}</h3>", escape_html(column));
    for point in &chart.points {
        let width = if max > 0.0 { point.value / max * 100.0 } else { 0.0 };
        let _ = writeln!(
            out,
            "<div class=\"bar-row\"><span class=\"bar-label\">{}</span><span class=\"bar\" style=\"width: {width:.1}%\"></span><span>{}</span></div>",
            escape_html(&point.bucket.to_string()),
            point.value
        );
    }
    out.push_str("</div>\n");
}

fn numeric_section(out: &mut String, report: &SummaryReport) {
    let rows: Vec<Vec<String>> = report
        .columns
        .iter()
        .filter_map(|c| match &c.summary {
            ColumnSummary::Numeric(s) => Some(vec![
                c.column.clone(),
                s.count.to_string(),
                format_number(s.mean, 2),
                s.std_dev.map_or_else(|| "–".to_string(), |v| format_number(v, 2)),
                format_number(s.min, 2),
                format_number(s.median, 2),
                format_number(s.p95, 2),
                format_number(s.max, 2),
                format_pct(s.missing_pct),
            ]),
            _ => None,
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    out.push_str("<div class=\"section\"><h2>Numeric Columns Summary</h2>\n");
    stats_table(
        out,
        &["Column", "Count", "Mean", "Std", "Min", "Median", "95th pct", "Max", "Missing"],
        rows,
    );
    out.push_str("</div>\n");
}

fn categorical_section(out: &mut String, report: &SummaryReport) {
    let rows: Vec<Vec<String>> = report
        .columns
        .iter()
        .filter_map(|c| match &c.summary {
            ColumnSummary::Categorical(s) => Some(vec![
                c.column.clone(),
                s.distinct.to_string(),
                s.most_common.clone().unwrap_or_default(),
                s.most_common_count.to_string(),
                s.others_count.to_string(),
                format_pct(s.missing_pct),
            ]),
            _ => None,
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    out.push_str("<div class=\"section\"><h2>Categorical Columns Summary</h2>\n");
    stats_table(
        out,
        &["Column", "Unique", "Most common", "Count", "Others", "Missing"],
        rows,
    );
    out.push_str("</div>\n");
}

fn datetime_section(out: &mut String, report: &SummaryReport) {
    let rows: Vec<Vec<String>> = report
        .columns
        .iter()
        .filter_map(|c| match &c.summary {
            ColumnSummary::Datetime(s) => Some(vec![
                c.column.clone(),
                s.first.format("%Y-%m-%d %H:%M:%S").to_string(),
                s.last.format("%Y-%m-%d %H:%M:%S").to_string(),
                s.date_range.clone(),
                s.total_records.to_string(),
                format_pct(s.missing_pct),
            ]),
            _ => None,
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    out.push_str("<div class=\"section\"><h2>Datetime Columns Summary</h2>\n");
    stats_table(
        out,
        &["Column", "First", "Last", "Range", "Records", "Missing"],
        rows,
    );
    out.push_str("</div>\n");
}

/// Render a standalone HTML report of a filtered view.
///
/// `dataset` is the filtered view, `report` its summary and `filters` the
/// predicates that produced it.
pub fn render_html(
    title: &str,
    dataset: &Dataset,
    types: &TypeMap,
    filters: &FilterState,
    report: &SummaryReport,
) -> String {
    let title = escape_html(title);
    let mut out = String::new();

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>{title}</title>\n    <meta charset=\"utf-8\">\n    <style>{STYLE}    </style>\n</head>\n<body>\n"
    );
    let _ = write!(
        out,
        "    <div class=\"header\">\n        <h1>{title}</h1>\n        <p>Generated on {}</p>\n        <p>Dataset: {} rows × {} columns</p>\n    </div>\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        group_thousands(dataset.len()),
        dataset.width()
    );

    let applied: Vec<String> = filters
        .predicates()
        .iter()
        .filter_map(|p| describe_predicate(p, types))
        .collect();
    if !applied.is_empty() {
        out.push_str("<div class=\"filter-summary\"><h3>Applied Filters</h3><ul>\n");
        for line in &applied {
            let _ = writeln!(out, "<li>{}</li>", escape_html(line));
        }
        out.push_str("</ul></div>\n");
    }

    numeric_section(&mut out, report);
    categorical_section(&mut out, report);
    datetime_section(&mut out, report);

    for column in &report.columns {
        chart_block(&mut out, &column.column, &column.chart);
    }

    out.push_str("</body></html>\n");
    out
}

/// Write [`render_html`] output to `path`.
pub fn export_html(
    path: &Path,
    title: &str,
    dataset: &Dataset,
    types: &TypeMap,
    filters: &FilterState,
    report: &SummaryReport,
) -> Result<()> {
    let html = render_html(title, dataset, types, filters, report);
    std::fs::write(path, html).with_context(|| format!("writing HTML report {}", path.display()))?;
    log::info!("Exported HTML report to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write `dataset` as CSV with a header row; missing cells are empty.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.column_names())
        .context("writing CSV header")?;
    for i in 0..dataset.len() {
        let record: Vec<String> = dataset
            .row(i)
            .map(|cell| if cell.is_missing() { String::new() } else { cell.to_string() })
            .collect();
        wtr.write_record(&record)
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(())
}

pub fn export_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(dataset, BufWriter::new(file))?;
    log::info!("Exported {} rows to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{classify, summarize, CellValue, Column};

    fn people() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "name",
                vec!["Alice".into(), "Bob".into(), "Charlie".into(), "Dana".into(), "Eve".into()],
            ),
            Column::new(
                "age",
                vec![
                    CellValue::Integer(25),
                    CellValue::Integer(30),
                    CellValue::Null,
                    CellValue::Integer(35),
                    CellValue::Integer(40),
                ],
            ),
            Column::new(
                "team",
                vec!["red".into(), "red".into(), "red".into(), "blue".into(), "blue".into()],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn report_lists_only_effective_filters() {
        let ds = people();
        let types = classify(&ds);
        let filters = FilterState::new()
            .with(FilterPredicate::text_search("  "))
            .with(FilterPredicate::numeric_range("age", 20.0, 40.0))
            .with(FilterPredicate::categorical_in("team", [SELECT_ALL]))
            .with(FilterPredicate::numeric_range("name", 1.0, 2.0));
        let report = summarize(&ds, &types, 20).unwrap();
        let html = render_html("People <2024>", &ds, &types, &filters, &report);

        assert!(html.contains("<h1>People &lt;2024&gt;</h1>"));
        assert!(html.contains("Applied Filters"));
        assert!(html.contains("<li>age: 20 to 40</li>"));
        assert!(!html.contains("Text search"));
        assert!(!html.contains("<li>team"));
        assert!(!html.contains("<li>name"));
        assert!(html.contains("Dataset: 5 rows × 3 columns"));
        assert!(html.contains("Numeric Columns Summary"));
        assert!(html.contains("Categorical Columns Summary"));
        assert!(!html.contains("Datetime Columns Summary"));
    }

    #[test]
    fn report_without_filters_has_no_filter_block() {
        let ds = people();
        let types = classify(&ds);
        let report = summarize(&ds, &types, 20).unwrap();
        let html = render_html("t", &ds, &types, &FilterState::new(), &report);
        assert!(!html.contains("Applied Filters"));
        assert!(html.contains("class=\"bar\""));
    }

    #[test]
    fn csv_leaves_missing_cells_empty() {
        let mut buf = Vec::new();
        write_csv(&people(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "name,age,team\nAlice,25,red\nBob,30,red\nCharlie,,red\nDana,35,blue\nEve,40,blue\n"
        );
    }
}
