use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{HLine, Legend, Line, LineStyle, Plot, PlotPoints};

use spl_monitor::{AppState, View};

use super::{format_time, from_axis, to_axis};

// ---------------------------------------------------------------------------
// SPL chart (central panel)
// ---------------------------------------------------------------------------

/// Render the dB(A) chart, or the message for the current empty/error state.
pub fn spl_plot(ui: &mut Ui, state: &AppState) {
    let (filtered, stats) = match state.view() {
        View::Ready {
            filtered, stats, ..
        } => (filtered, stats),
        View::NoSource => {
            centered_message(ui, "Open a file to view SPL data  (File → Open…)", None);
            return;
        }
        View::Unavailable(reason) => {
            centered_message(ui, reason, Some(Color32::RED));
            return;
        }
        View::NoData => {
            centered_message(ui, "No SPL data found.", Some(Color32::YELLOW));
            return;
        }
        View::NoDataInRange { .. } => {
            centered_message(ui, "No SPL data in the selected range.", Some(Color32::YELLOW));
            return;
        }
    };

    let points: PlotPoints = filtered
        .iter()
        .map(|m| [to_axis(m.timestamp), m.value])
        .collect();

    Plot::new("spl_plot")
        .legend(Legend::default())
        .x_axis_label("Time (UTC)")
        .y_axis_label("dB(A)")
        .x_axis_formatter(|mark, _range| {
            from_axis(mark.value)
                .map(|t| t.format("%m-%d %H:%M").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|name, point| {
            let time = from_axis(point.x).map(format_time).unwrap_or_default();
            if name.is_empty() {
                format!("{time}\n{:.1} dB(A)", point.y)
            } else {
                format!("{name}\n{time}\n{:.1} dB(A)", point.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name("SPL dB(A)")
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );
            plot_ui.hline(
                HLine::new(stats.mean)
                    .name(format!("Avg {:.1}", stats.mean))
                    .color(Color32::from_rgb(255, 165, 0))
                    .style(LineStyle::dashed_loose()),
            );
        });
}

fn centered_message(ui: &mut Ui, text: &str, color: Option<Color32>) {
    let mut text = RichText::new(text).heading();
    if let Some(c) = color {
        text = text.color(c);
    }
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(text);
    });
}
