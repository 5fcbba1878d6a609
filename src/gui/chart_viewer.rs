//! Chart Viewer Widget
//! Central panel showing the selected metric for the selected countries.

use crate::charts::{ChartData, ChartPlotter};
use egui::{Color32, RichText};

/// Central chart area. Holds the chart built for the current selection.
#[derive(Default)]
pub struct ChartViewer {
    pub chart: Option<ChartData>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.chart = None;
    }

    pub fn set_chart(&mut self, chart: ChartData) {
        self.chart = Some(chart);
    }

    pub fn has_lines(&self) -> bool {
        self.chart.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(chart) = &self.chart else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ui.vertical_centered(|ui| {
            ui.label(RichText::new(chart.metric.title()).size(20.0).strong());
        });
        ui.add_space(5.0);

        if !chart.unavailable.is_empty() {
            let countries = chart.unavailable.join(", ");
            let notice = if chart.metric.is_per_capita() {
                format!("⚠ No population data for: {countries}")
            } else {
                let label = chart.metric.label().to_lowercase();
                format!("⚠ No {label} data for: {countries}")
            };
            ui.label(
                RichText::new(notice)
                    .size(12.0)
                    .color(Color32::from_rgb(243, 156, 18)),
            );
            ui.add_space(5.0);
        }

        if chart.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Select countries to plot").size(16.0));
            });
            return;
        }

        let height = ui.available_height().max(200.0);
        ChartPlotter::draw_line_chart(ui, chart, height);
    }
}
