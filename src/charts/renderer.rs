//! Static Chart Renderer
//! Exports a time series chart to PNG using plotters.
//!
//! Layout:
//! 1. Title: metric title centered
//! 2. Line per country, x axis labelled with dates, y axis with the metric label
//! 3. Legend box in the upper left corner

use crate::charts::plotter::{ChartData, DATE_FORMAT};
use log::info;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render: no country has data for {0}")]
    Empty(String),
    #[error("Drawing failed: {0}")]
    Drawing(String),
}

fn drawing_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Drawing(e.to_string())
}

// Matches the interactive palette
const LINE_COLORS: [RGBColor; 10] = [
    RGBColor(52, 152, 219),
    RGBColor(231, 76, 60),
    RGBColor(46, 204, 113),
    RGBColor(155, 89, 182),
    RGBColor(243, 156, 18),
    RGBColor(26, 188, 156),
    RGBColor(233, 30, 99),
    RGBColor(0, 188, 212),
    RGBColor(121, 85, 72),
    RGBColor(96, 125, 139),
];

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Upper bound of the y axis: 10% headroom, never zero.
    pub fn y_upper_bound(chart: &ChartData) -> f64 {
        let max = chart.max_value();
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }

    /// Render `chart` to a PNG at `path`.
    pub fn render_png(
        chart: &ChartData,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if chart.is_empty() {
            return Err(RenderError::Empty(chart.metric.label().to_string()));
        }

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error)?;

        let n_dates = chart.dates.len().max(2);
        let dates = chart.dates.clone();
        let date_label = move |x: &usize| {
            dates
                .get(*x)
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };

        let mut plot = ChartBuilder::on(&root)
            .caption(chart.metric.title(), ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(0usize..n_dates - 1, 0f64..Self::y_upper_bound(chart))
            .map_err(drawing_error)?;

        plot.configure_mesh()
            .x_desc("Date")
            .y_desc(chart.metric.axis_label())
            .x_labels(8)
            .x_label_formatter(&date_label)
            .draw()
            .map_err(drawing_error)?;

        for (i, line) in chart.lines.iter().enumerate() {
            let color = LINE_COLORS[i % LINE_COLORS.len()];
            plot.draw_series(LineSeries::new(
                line.values.iter().copied().enumerate(),
                color.stroke_width(2),
            ))
            .map_err(drawing_error)?
            .label(line.country.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }

        plot.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(drawing_error)?;

        root.present().map_err(drawing_error)?;
        info!("Exported chart to {}", path.display());
        Ok(())
    }
}
