mod app;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use eframe::egui;

use app::SplMonitorApp;
use spl_monitor::data::loader::parse_timestamp;
use spl_monitor::{
    AppState, Config, FieldValue, SeriesLoader, TimeRange, View, create_source, open_path,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read measurements from a local .json, .csv or .parquet file instead
    /// of the configured source.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Fetch timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the desktop viewer (default).
    View,
    /// Print min / max / average over a window and exit.
    Summary {
        /// Window start; defaults to the first measurement.
        #[arg(long, value_parser = parse_time_arg)]
        from: Option<DateTime<Utc>>,
        /// Window end; defaults to the last measurement.
        #[arg(long, value_parser = parse_time_arg)]
        to: Option<DateTime<Utc>>,
    },
}

fn parse_time_arg(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(&FieldValue::String(s.to_string())).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(secs) = cli.timeout {
        config.fetch_timeout_secs = secs;
        config.validate().context("invalid --timeout")?;
    }

    let mut state = AppState::new(config.fields.clone());
    if let Some(loader) = build_loader(&cli, &config)? {
        state.replace_loader(loader);
    }

    match cli.command {
        Some(Command::Summary { from, to }) => run_summary(&mut state, from, to),
        Some(Command::View) | None => run_viewer(state, config),
    }
}

fn build_loader(cli: &Cli, config: &Config) -> Result<Option<SeriesLoader>> {
    let timeout = config.fetch_timeout();
    let source = match (&cli.file, &config.source) {
        (Some(path), _) => open_path(path, timeout)?,
        (None, Some(source)) => create_source(source, timeout)?,
        (None, None) => return Ok(None),
    };
    log::info!("Reading measurements from {}", source.describe());
    Ok(Some(SeriesLoader::new(source)))
}

// ---------------------------------------------------------------------------
// Headless summary
// ---------------------------------------------------------------------------

fn run_summary(
    state: &mut AppState,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<()> {
    match state.view() {
        View::NoSource => bail!("no record source: pass --file or set [source] in the config"),
        View::Unavailable(reason) => bail!("{reason}"),
        View::NoData => {
            println!("No SPL data found.");
            return Ok(());
        }
        View::Ready { .. } | View::NoDataInRange { .. } => {}
    }

    let bounds = state
        .bounds()
        .ok_or_else(|| anyhow!("loaded series has no bounds"))?;
    if let Some((start, end)) = open_window(from, to, bounds) {
        state.set_range(start, end)?;
    }

    if let Some(source) = state.source_description() {
        println!("Source: {source}");
    }
    if let Some(report) = state.last_report() {
        println!(
            "Records: {} fetched, {} kept, {} dropped",
            report.fetched, report.kept, report.dropped
        );
    }
    println!("Span: {bounds}");

    match state.view() {
        View::Ready {
            range,
            filtered,
            stats,
            ..
        } => {
            println!("Window: {range}");
            println!("Samples: {}", filtered.len());
            println!("Min dB(A): {:.1}", stats.min);
            println!("Max dB(A): {:.1}", stats.max);
            println!("Avg dB(A): {:.1}", stats.mean);
        }
        View::NoDataInRange { range, .. } => {
            println!("Window: {range}");
            println!("No SPL data in the selected range.");
        }
        View::Unavailable(reason) => bail!("{reason}"),
        View::NoSource | View::NoData => {}
    }
    Ok(())
}

/// Fill a missing window end from the series bounds. A given end is never
/// moved, and a filled one never crosses it, so only two explicit ends can
/// be inverted.
fn open_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    bounds: TimeRange,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match (from, to) {
        (None, None) => None,
        (Some(start), Some(end)) => Some((start, end)),
        (Some(start), None) => Some((start, bounds.end().max(start))),
        (None, Some(end)) => Some((bounds.start().min(end), end)),
    }
}

// ---------------------------------------------------------------------------
// Desktop viewer
// ---------------------------------------------------------------------------

fn run_viewer(state: AppState, config: Config) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let title = config.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(SplMonitorApp::new(state, &config)))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
