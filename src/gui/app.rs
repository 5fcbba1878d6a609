//! COVID Charts Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{ChartData, StaticChartRenderer};
use crate::config::AppConfig;
use crate::data::{DataLoader, Metric, NormalizationPipeline, NormalizedData};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::population::JsonPopulationProvider;
use egui::SidePanel;
use log::{debug, error, info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

/// Loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Box<NormalizedData>),
    Error(String),
}

/// Main application window.
pub struct CovidChartsApp {
    config: AppConfig,
    data: Option<NormalizedData>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl CovidChartsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.data_dir.clone()),
            config,
            data: None,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Pick another data folder and reload from it
    fn handle_browse_folder(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.data_dir)
            .pick_folder()
        {
            self.config.data_dir = dir.clone();
            self.control_panel.data_dir = dir;
            self.start_loading();
        }
    }

    /// Load and normalize the data folder in a background thread
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.control_panel.export_enabled = false;
        self.control_panel.set_progress(5.0, "Loading data...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            Self::run_loading(tx, config);
        });
    }

    /// Run loading (called from background thread)
    fn run_loading(tx: Sender<LoadResult>, config: AppConfig) {
        let _ = tx.send(LoadResult::Progress(10.0, "Reading CSV files...".to_string()));

        let raw = match DataLoader::new(&config).load_dir(&config.data_dir) {
            Ok(raw) => raw,
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(40.0, "Reading population data...".to_string()));

        // Without population data only the per-capita tables come out empty
        let provider = match JsonPopulationProvider::from_path(&config.population_path()) {
            Ok(provider) => provider,
            Err(e) => {
                warn!("{e}; per-capita tables will be empty");
                JsonPopulationProvider::default()
            }
        };
        if provider.is_empty() {
            warn!("No usable population entries");
        }

        let _ = tx.send(LoadResult::Progress(60.0, "Normalizing tables...".to_string()));

        let result = NormalizationPipeline::new(&provider)
            .with_strict_country_sets(config.strict_country_sets)
            .run(&raw);

        match result {
            Ok(data) => {
                let _ = tx.send(LoadResult::Complete(Box::new(data)));
            }
            Err(e) => {
                let _ = tx.send(LoadResult::Error(e.to_string()));
            }
        }
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(data) => {
                        let message = format!(
                            "Complete! {} countries, {} days, {} with population",
                            data.countries().len(),
                            data.dates().len(),
                            data.population().len()
                        );
                        info!("{message}");
                        for (metric, df) in Metric::ALL.iter().zip(data.tables()) {
                            debug!("{metric}: {} rows", df.height());
                        }
                        if data.population().is_empty() {
                            warn!("No population data, per-capita metrics have no rows");
                        } else if !data.population().missing().is_empty() {
                            warn!("No population for: {}", data.population().missing().join(", "));
                        }
                        self.control_panel.update_countries(data.countries().clone());
                        self.control_panel.set_progress(100.0, &message);
                        self.data = Some(*data);
                        self.is_loading = false;
                        should_keep_receiver = false;
                        self.refresh_chart();
                    }
                    LoadResult::Error(e) => {
                        error!("Loading failed: {e}");
                        self.data = None;
                        self.chart_viewer.clear();
                        self.control_panel.update_countries(Default::default());
                        self.control_panel.export_enabled = false;
                        self.control_panel.set_progress(0.0, &format!("Error: {}", e));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Rebuild the chart for the current metric and selection
    fn refresh_chart(&mut self) {
        let Some(data) = &self.data else {
            self.chart_viewer.clear();
            return;
        };

        let countries = self.control_panel.selected_countries();
        let chart = ChartData::build(data, self.control_panel.metric, &countries);
        self.chart_viewer.set_chart(chart);
        self.control_panel.export_enabled = self.chart_viewer.has_lines();
    }

    /// Handle PNG export of the current chart
    fn handle_export_png(&mut self) {
        let Some(chart) = &self.chart_viewer.chart else {
            self.control_panel.set_progress(0.0, "No chart to export");
            return;
        };

        let file_name = format!("{}.png", chart.metric.label().replace(' ', "_"));
        let output_path = match rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(file_name)
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        match StaticChartRenderer::render_png(
            chart,
            &output_path,
            self.config.export_width,
            self.config.export_height,
        ) {
            Ok(()) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Complete! Exported {}", output_path.display()),
                );
                if let Err(e) = open::that(&output_path) {
                    error!("Failed to open {}: {e}", output_path.display());
                }
            }
            Err(e) => {
                error!("Export failed: {e}");
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for CovidChartsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseFolder => self.handle_browse_folder(),
                        ControlPanelAction::Reload => self.start_loading(),
                        ControlPanelAction::SelectionChanged => self.refresh_chart(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
                       Hubei,China,30.97,112.27,444,444\n\
                       ,Italy,41.87,12.56,0,2\n";

    fn data_dir() -> anyhow::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        for kind in ["confirmed", "deaths", "recovered"] {
            fs::write(dir.path().join(format!("time_series_{kind}.csv")), CSV)?;
        }
        Ok(dir)
    }

    fn app(config: AppConfig) -> CovidChartsApp {
        CovidChartsApp {
            control_panel: ControlPanel::new(config.data_dir.clone()),
            config,
            data: None,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    fn load(config: AppConfig) -> Vec<LoadResult> {
        let (tx, rx) = channel();
        CovidChartsApp::run_loading(tx, config);
        rx.try_iter().collect()
    }

    #[test]
    fn missing_population_file_still_completes() -> anyhow::Result<()> {
        let dir = data_dir()?;
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let results = load(config);

        let Some(LoadResult::Complete(data)) = results.last() else {
            anyhow::bail!("loading did not complete");
        };
        assert_eq!(data.countries().len(), 2);
        assert_eq!(
            data.series(Metric::Confirmed, "China"),
            Some(vec![444.0, 444.0])
        );
        assert_eq!(data.table(Metric::ConfirmedPerCapita).height(), 0);
        assert!(data.population().is_empty());
        Ok(())
    }

    #[test]
    fn failed_reload_drops_previous_data() -> anyhow::Result<()> {
        let dir = data_dir()?;
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let mut app = app(config.clone());

        let (tx, rx) = channel();
        app.load_rx = Some(rx);
        app.is_loading = true;
        CovidChartsApp::run_loading(tx, config);
        app.check_load_results();
        assert!(app.data.is_some());
        assert_eq!(app.control_panel.countries.len(), 2);

        let (tx, rx) = channel();
        app.load_rx = Some(rx);
        app.is_loading = true;
        assert!(tx.send(LoadResult::Error("folder vanished".to_string())).is_ok());
        app.check_load_results();

        assert!(app.data.is_none());
        assert!(app.chart_viewer.chart.is_none());
        assert!(app.control_panel.countries.is_empty());
        assert!(app.control_panel.status.starts_with("Error"));
        assert!(!app.is_loading);
        Ok(())
    }
}
