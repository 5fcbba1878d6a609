//! COVID Charts - Time Series Normalization & Interactive Chart Viewer
//!
//! Loads the confirmed/deaths/recovered time series, merges provinces into
//! national totals, derives per-100k values and plots selected countries.

mod charts;
mod config;
mod data;
mod gui;
mod population;

use config::AppConfig;
use eframe::egui;
use gui::CovidChartsApp;
use log::{debug, error};

const DEFAULT_LOGGING_LEVEL: &str = "info";

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL);
    }
    pretty_env_logger::init_timed();

    let config = AppConfig::load(&AppConfig::default_path()).unwrap_or_else(|e| {
        error!("{e}; using default config");
        AppConfig::default()
    });
    debug!("config: {config:?}");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("COVID Charts"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "COVID Charts",
        options,
        Box::new(move |cc| Ok(Box::new(CovidChartsApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
