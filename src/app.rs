use eframe::egui;

use crate::state::Session;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CsvDashApp {
    pub session: Session,
}

impl CsvDashApp {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl eframe::App for CsvDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.session);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.session);
            });

        // ---- Central panel: statistics, charts, preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::dashboard(ui, &self.session);
        });
    }
}
