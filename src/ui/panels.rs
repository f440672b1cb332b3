use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use spl_monitor::{open_path, AppState, SeriesLoader, TimeRange, View};

use super::{dragged_window, format_time, from_axis, to_axis};

// ---------------------------------------------------------------------------
// Left side panel – time window and summary
// ---------------------------------------------------------------------------

/// Render the left panel: range controls and summary metrics.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Time Range");
    ui.separator();

    let (Some(bounds), Some(range)) = (state.bounds(), state.range()) else {
        ui.label("No data loaded.");
        return;
    };

    range_sliders(ui, state, bounds, range);
    ui.add_space(4.0);
    range_dates(ui, state, bounds, range);
    ui.add_space(4.0);
    if ui.button("Full range").clicked() {
        state.reset_range();
    }

    ui.add_space(8.0);
    ui.heading("Summary");
    ui.separator();

    match state.view() {
        View::Ready {
            filtered, stats, ..
        } => {
            egui::Grid::new("summary_grid")
                .num_columns(2)
                .spacing([24.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    metric(ui, "Min dB(A)", stats.min);
                    metric(ui, "Max dB(A)", stats.max);
                    metric(ui, "Avg dB(A)", stats.mean);
                    ui.label("Samples");
                    ui.label(filtered.len().to_string());
                    ui.end_row();
                });
        }
        View::NoDataInRange { .. } => {
            ui.colored_label(Color32::YELLOW, "No SPL data in the selected range.");
        }
        _ => {}
    }
}

fn metric(ui: &mut Ui, label: &str, value: f64) {
    ui.label(label);
    ui.label(RichText::new(format!("{value:.1}")).strong().size(18.0));
    ui.end_row();
}

/// Start / end sliders over the series bounds. End is raised to start
/// rather than producing an inverted window.
fn range_sliders(ui: &mut Ui, state: &mut AppState, bounds: TimeRange, range: TimeRange) {
    let lo = to_axis(bounds.start());
    let hi = to_axis(bounds.end());
    let mut start = to_axis(range.start()).clamp(lo, hi);
    let mut end = to_axis(range.end()).clamp(lo, hi);

    let fmt = |x: f64, _: std::ops::RangeInclusive<usize>| {
        from_axis(x).map(format_time).unwrap_or_default()
    };

    ui.label("Start");
    let start_moved = ui
        .add(egui::Slider::new(&mut start, lo..=hi).custom_formatter(fmt))
        .changed();
    ui.label("End");
    let end_moved = ui
        .add(egui::Slider::new(&mut end, lo..=hi).custom_formatter(fmt))
        .changed();

    if !(start_moved || end_moved) {
        return;
    }
    let dragged = dragged_window(
        range,
        start_moved.then_some(start),
        end_moved.then_some(end),
    );
    if let Some(window) = dragged {
        apply_range(state, window);
    }
}

fn apply_range(state: &mut AppState, window: TimeRange) {
    if let Err(e) = state.set_range(window.start(), window.end()) {
        log::warn!("Rejected window {window}: {e}");
    }
}

/// Whole-day selection through date pickers, clamped to the series bounds.
fn range_dates(ui: &mut Ui, state: &mut AppState, bounds: TimeRange, range: TimeRange) {
    let mut start_day = range.start().date_naive();
    let mut end_day = range.end().date_naive();

    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Days");
        changed |= ui
            .add(DatePickerButton::new(&mut start_day).id_salt("start_day"))
            .changed();
        ui.label("to");
        changed |= ui
            .add(DatePickerButton::new(&mut end_day).id_salt("end_day"))
            .changed();
    });
    if !changed {
        return;
    }

    let (start, end) = (day_start(start_day), day_end(end_day));
    match TimeRange::new(start, end) {
        Ok(picked) => {
            apply_range(state, picked.clamp_to(&bounds));
        }
        Err(e) => state.status_message = Some(e.to_string()),
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .map(|t| t.and_utc())
        .unwrap_or_else(|| day_start(day))
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, fetch_timeout: Duration) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state, fetch_timeout);
                ui.close_menu();
            }
        });

        if ui.button("Refresh").clicked() {
            state.refresh();
        }

        ui.separator();

        if let Some(source) = state.source_description() {
            ui.label(source);
        }
        if let Some(report) = state.last_report() {
            ui.label(format!("{} measurements", report.kept));
            if report.dropped > 0 {
                ui.label(
                    RichText::new(format!("{} malformed records dropped", report.dropped))
                        .color(Color32::YELLOW),
                );
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, fetch_timeout: Duration) {
    let file = rfd::FileDialog::new()
        .set_title("Open SPL measurements")
        .add_filter("Supported files", &["json", "csv", "parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match open_path(&path, fetch_timeout) {
            Ok(source) => {
                log::info!("Opening {}", path.display());
                state.status_message = None;
                state.replace_loader(SeriesLoader::new(source));
            }
            Err(e) => {
                log::error!("Failed to open file: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
