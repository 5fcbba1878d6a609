//! Chart Plotter Module
//! Builds per-country time series and draws them as interactive line charts using egui_plot.

use crate::data::{Metric, NormalizedData};
use chrono::NaiveDate;
use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotPoints};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219),  // Blue
    Color32::from_rgb(231, 76, 60),   // Red
    Color32::from_rgb(46, 204, 113),  // Green
    Color32::from_rgb(155, 89, 182),  // Purple
    Color32::from_rgb(243, 156, 18),  // Orange
    Color32::from_rgb(26, 188, 156),  // Teal
    Color32::from_rgb(233, 30, 99),   // Pink
    Color32::from_rgb(0, 188, 212),   // Cyan
    Color32::from_rgb(121, 85, 72),   // Brown
    Color32::from_rgb(96, 125, 139),  // Blue Grey
];

/// Date format used on axes and tooltips.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One country's values, one per date.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    pub country: String,
    pub values: Vec<f64>,
}

/// Everything needed to draw one metric for the selected countries.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub metric: Metric,
    pub dates: Vec<NaiveDate>,
    pub lines: Vec<CountrySeries>,
    /// Selected countries with no row in this metric's table.
    pub unavailable: Vec<String>,
}

impl ChartData {
    pub fn build(data: &NormalizedData, metric: Metric, countries: &[String]) -> Self {
        let mut lines = Vec::new();
        let mut unavailable = Vec::new();

        for country in countries {
            match data.series(metric, country) {
                Some(values) => lines.push(CountrySeries {
                    country: country.clone(),
                    values,
                }),
                None => unavailable.push(country.clone()),
            }
        }

        Self {
            metric,
            dates: data.dates().to_vec(),
            lines,
            unavailable,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Largest value over all lines, 0 when there is nothing to draw.
    pub fn max_value(&self) -> f64 {
        self.lines
            .iter()
            .flat_map(|l| l.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Creates time series line charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Label for an x position; only whole indices inside the date range get one.
    pub fn date_label(dates: &[NaiveDate], x: f64) -> String {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        dates
            .get(rounded as usize)
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Draw one line per country, x = day index, y = metric value.
    pub fn draw_line_chart(ui: &mut egui::Ui, chart: &ChartData, height: f32) {
        let axis_dates = chart.dates.clone();
        let tooltip_dates = chart.dates.clone();
        let per_capita = chart.metric.is_per_capita();

        Plot::new(format!("series_{}", chart.metric.index()))
            .height(height)
            .legend(Legend::default())
            .x_axis_label("Date")
            .y_axis_label(chart.metric.axis_label())
            .x_axis_formatter(move |mark, _range| Self::date_label(&axis_dates, mark.value))
            .label_formatter(move |name, value| {
                let date = Self::date_label(&tooltip_dates, value.x.round());
                let amount = if per_capita {
                    format!("{:.3}", value.y)
                } else {
                    format!("{:.0}", value.y)
                };
                if name.is_empty() {
                    format!("{date}\n{amount}")
                } else {
                    format!("{name}\n{date}\n{amount}")
                }
            })
            .show(ui, |plot_ui| {
                for (i, line) in chart.lines.iter().enumerate() {
                    let points: PlotPoints = line
                        .values
                        .iter()
                        .enumerate()
                        .map(|(x, &y)| [x as f64, y])
                        .collect();

                    plot_ui.line(
                        Line::new(points)
                            .color(Self::series_color(i))
                            .width(2.0)
                            .name(&line.country),
                    );
                }
            });
    }
}
