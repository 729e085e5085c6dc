mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::CsvDashApp;
use csvdash::config::DashboardConfig;
use csvdash::data::loader::load_table;
use csvdash::data::{classify, summarize_with, FilterState};
use csvdash::export;
use state::Session;

/// Interactive dashboard and static reports for tabular data files.
#[derive(Parser, Debug)]
#[command(name = "csvdash", version, about)]
struct Cli {
    /// Table to open (CSV, TSV, JSON, Parquet or Excel)
    file: Option<PathBuf>,

    /// Worksheet name or zero-based index for Excel files
    #[arg(long)]
    sheet: Option<String>,

    /// Write an HTML report to this path and exit
    #[arg(long, value_name = "OUT.html")]
    export: Option<PathBuf>,

    /// Write the table as CSV to this path and exit
    #[arg(long, value_name = "OUT.csv")]
    csv: Option<PathBuf>,

    /// Dashboard and report title
    #[arg(long)]
    title: Option<String>,

    /// Categories charted individually before "Others"
    #[arg(long)]
    top_k: Option<usize>,

    /// JSON configuration file
    #[arg(long, value_name = "cfg.json")]
    config: Option<PathBuf>,
}

impl Cli {
    /// File configuration with command-line overrides applied.
    fn dashboard_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Load, classify, summarize and write the requested reports without a window.
fn run_headless(cli: &Cli, config: &DashboardConfig) -> Result<()> {
    let path = cli
        .file
        .as_deref()
        .context("An input file is required with --export or --csv")?;
    let dataset = load_table(path, cli.sheet.as_deref())?;
    let types = classify(&dataset);

    if let Some(out) = &cli.export {
        let report = summarize_with(&dataset, &types, &config.summary_options())?;
        export::export_html(out, &config.title, &dataset, &types, &FilterState::new(), &report)?;
    }
    if let Some(out) = &cli.csv {
        export::export_csv(out, &dataset)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.dashboard_config()?;

    if cli.export.is_some() || cli.csv.is_some() {
        return run_headless(&cli, &config);
    }

    let mut session = Session::new(config);
    if let Some(path) = &cli.file {
        let dataset = load_table(path, cli.sheet.as_deref())?;
        session.set_dataset(path, dataset);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    let title = format!("{} – csvdash", session.config.title);
    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(CsvDashApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
