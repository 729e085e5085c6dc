use std::path::Path;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use csvdash::data::loader::{load_table, SUPPORTED_EXTENSIONS};
use csvdash::data::SELECT_ALL;

use crate::state::Session;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.  The view is recomputed only when a
/// control actually changed this frame.
pub fn side_panel(ui: &mut Ui, session: &mut Session) {
    ui.heading("Filters");
    ui.separator();

    if session.source.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let mut changed = false;
    let mut reset = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Global text search ----
            ui.strong("Search");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut session.controls.text).hint_text("Search text columns"))
                .changed();
            ui.separator();

            // ---- Numeric ranges ----
            if !session.controls.numeric.is_empty() {
                ui.strong("Numeric ranges");
                for c in &mut session.controls.numeric {
                    let (lo, hi) = c.bounds;
                    let speed = ((hi - lo) / 200.0).max(1e-6);
                    ui.label(&c.column);
                    ui.horizontal(|ui: &mut Ui| {
                        let upper = c.selected.1;
                        changed |= ui
                            .add(DragValue::new(&mut c.selected.0).range(lo..=upper).speed(speed))
                            .changed();
                        ui.label("to");
                        let lower = c.selected.0;
                        changed |= ui
                            .add(DragValue::new(&mut c.selected.1).range(lower..=hi).speed(speed))
                            .changed();
                    });
                }
                ui.separator();
            }

            // ---- Date ranges ----
            if !session.controls.dates.is_empty() {
                ui.strong("Date ranges");
                for c in &mut session.controls.dates {
                    ui.label(&c.column);
                    ui.horizontal(|ui: &mut Ui| {
                        changed |= ui
                            .add(DatePickerButton::new(&mut c.selected.0).id_salt(&format!("{}_start", c.column)))
                            .changed();
                        ui.label("to");
                        changed |= ui
                            .add(DatePickerButton::new(&mut c.selected.1).id_salt(&format!("{}_end", c.column)))
                            .changed();
                    });
                    if c.selected.0 > c.selected.1 {
                        c.selected.1 = c.selected.0;
                    }
                }
                ui.separator();
            }

            // ---- Categorical checklists (collapsible) ----
            for c in &mut session.controls.categories {
                let header_text = if c.is_all() {
                    format!("{}  (all)", c.column)
                } else {
                    format!("{}  ({}/{})", c.column, c.selected.len(), c.choices.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(&c.column)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        let mut all = c.is_all();
                        if ui.checkbox(&mut all, SELECT_ALL).changed() {
                            c.toggle(SELECT_ALL);
                            changed = true;
                        }
                        let choices = c.choices.clone();
                        for value in &choices {
                            let mut checked = c.selected.contains(value);
                            if ui.checkbox(&mut checked, value).changed() {
                                c.toggle(value);
                                changed = true;
                            }
                        }
                    });
            }

            ui.separator();
            reset = ui.button("Reset filters").clicked();
        });

    if reset {
        session.reset_filters();
    } else if changed {
        session.refilter();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, session: &mut Session) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(session);
                ui.close_menu();
            }
            let has_view = session.view.is_some();
            if ui.add_enabled(has_view, egui::Button::new("Export HTML…")).clicked() {
                export_dialog(session, "HTML report", "html");
                ui.close_menu();
            }
            if ui.add_enabled(has_view, egui::Button::new("Export CSV…")).clicked() {
                export_dialog(session, "CSV", "csv");
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(src), Some(view)) = (&session.source, &session.view) {
            ui.label(format!(
                "{} rows loaded, {} after filters",
                src.dataset.len(),
                view.dataset.len()
            ));
        }

        if let Some(msg) = &session.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Dialog filters match on the last extension only, so `csv.gz` becomes `gz`.
fn dialog_extensions() -> Vec<&'static str> {
    SUPPORTED_EXTENSIONS
        .iter()
        .map(|&ext| ext.rsplit('.').next().unwrap_or(ext))
        .collect()
}

pub fn open_file_dialog(session: &mut Session) {
    let file = rfd::FileDialog::new()
        .set_title("Open table")
        .add_filter("Supported files", &dialog_extensions())
        .add_filter("CSV", &["csv", "tsv", "gz"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("Excel", &["xlsx", "xls", "xlsb", "ods"])
        .pick_file();

    if let Some(path) = file {
        load_into(session, &path);
    }
}

/// Load `path` into the session, reporting failures in the status line.
pub fn load_into(session: &mut Session, path: &Path) {
    match load_table(path, None) {
        Ok(dataset) => session.set_dataset(path, dataset),
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            session.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn export_dialog(session: &mut Session, label: &str, extension: &str) {
    let Some(path) = rfd::FileDialog::new()
        .set_title(format!("Export {label}"))
        .set_file_name(format!("current_view.{extension}"))
        .add_filter(label, &[extension])
        .save_file()
    else {
        return;
    };

    let result = match extension {
        "html" => session.export_html(&path),
        _ => session.export_csv(&path),
    };
    session.status_message = match result {
        Ok(()) => None,
        Err(e) => {
            log::error!("Export failed: {e:#}");
            Some(format!("Export failed: {e:#}"))
        }
    };
}
