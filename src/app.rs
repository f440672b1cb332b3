use std::time::Duration;

use eframe::egui;

use spl_monitor::{AppState, Config};

use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SplMonitorApp {
    pub state: AppState,
    /// Timeout for sources opened from the File menu.
    pub fetch_timeout: Duration,
    pub title: String,
}

impl SplMonitorApp {
    pub fn new(state: AppState, config: &Config) -> Self {
        Self {
            state,
            fetch_timeout: config.fetch_timeout(),
            title: config.title.clone(),
        }
    }
}

impl eframe::App for SplMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, self.fetch_timeout);
        });

        // ---- Left side panel: time window and summary ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&self.title);
            ui.label("A-Weighted Sound Pressure Level Over Time");
            ui.separator();
            plot::spl_plot(ui, &self.state);
        });
    }
}
