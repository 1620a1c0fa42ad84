//! Module for visualizing strategy and buy-and-hold equity curves.

use chrono::Days;
use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::WHITE;

use crate::engine::Report;
use crate::errors::{Error, Result};

/// Aspect ratio for the generated charts.
const ASPECT_RATIO: f64 = 0.5625;
/// Width of the generated charts.
const WIDTH: u32 = 1280;
/// Size of the X-axis labels.
const X_LABEL_SIZE: i32 = 20;
/// Size of the Y-axis labels.
const Y_LABEL_SIZE: i32 = 20;

/// Output formats for the generated charts with output filename.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutput {
    /// Save to the output SVG file.
    Svg(String),
    /// Save to the output PNG file.
    Png(String),
}

impl Default for DrawOutput {
    fn default() -> Self {
        Self::Png("equity.png".to_string())
    }
}

/// Configuration options for chart generation.
#[derive(Debug, Default, Clone)]
pub struct DrawOptions {
    /// Chart title.
    title: Option<String>,
    /// Output format and path.
    output: DrawOutput,
}

impl DrawOptions {
    /// Sets the chart title.
    pub fn title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the output format and path.
    pub fn draw_output(mut self, output: DrawOutput) -> Self {
        self.output = output;
        self
    }
}

/// Chart drawing utility for backtest reports.
pub struct Draw<'d> {
    /// Reference to the backtest report.
    report: &'d Report,
    /// Drawing options.
    options: DrawOptions,
}

impl<'d> Draw<'d> {
    /// Creates a new `Draw` instance with the given report.
    pub fn with_report(report: &'d Report) -> Self {
        Self {
            report,
            options: DrawOptions::default(),
        }
    }

    /// Sets the drawing options.
    pub fn with_options(mut self, options: DrawOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the chart title, derived from the ticker when not set.
    pub fn title(&self) -> String {
        self.options
            .title
            .clone()
            .unwrap_or_else(|| format!("{} SMA Crossover vs Buy & Hold", self.report.config().ticker_name()))
    }

    /// Generates and saves the chart based on the configured options.
    pub fn plot(&self) -> Result<()> {
        let height = (WIDTH as f64 * ASPECT_RATIO) as u32;
        match &self.options.output {
            DrawOutput::Svg(path) => {
                let root = SVGBackend::new(path.as_str(), (WIDTH, height)).into_drawing_area();
                root.fill(&WHITE).map_err(|e| Error::Plotters(e.to_string()))?;
                self.draw_chart(&root)
            }
            DrawOutput::Png(path) => {
                let root = BitMapBackend::new(path.as_str(), (WIDTH, height)).into_drawing_area();
                root.fill(&WHITE).map_err(|e| Error::Plotters(e.to_string()))?;
                self.draw_chart(&root)
            }
        }
    }

    /// Draws both equity curves over the trading dates.
    fn draw_chart<DB: DrawingBackend>(&self, drawing_area: &DrawingArea<DB, Shift>) -> Result<()> {
        let rows = self.report.rows();
        let performance = self.report.performance();
        let config = self.report.config();

        let first_date = rows.first().ok_or(Error::EmptySeries)?.date();
        let mut last_date = rows.last().ok_or(Error::EmptySeries)?.date();
        if last_date == first_date {
            last_date = last_date + Days::new(1);
        }

        let (min_equity, max_equity) = performance
            .strategy_equity()
            .iter()
            .chain(performance.baseline_equity())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| (lo.min(*e), hi.max(*e)));
        let padding = ((max_equity - min_equity) * 0.1).max(0.01);

        let drawing_area = drawing_area.margin(10, 10, 20, 20);
        let mut chart = ChartBuilder::on(&drawing_area)
            .caption(self.title(), ("sans-serif", 30).into_font())
            .x_label_area_size(X_LABEL_SIZE * 2)
            .y_label_area_size(Y_LABEL_SIZE * 3)
            .build_cartesian_2d(first_date..last_date, min_equity - padding..max_equity + padding)
            .map_err(|e| Error::Plotters(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Equity (Start=1.0)")
            .x_label_style(("sans-serif", X_LABEL_SIZE))
            .y_label_style(("sans-serif", Y_LABEL_SIZE))
            .draw()
            .map_err(|e| Error::Plotters(e.to_string()))?;

        let dates = rows.iter().map(|r| r.date());
        chart
            .draw_series(LineSeries::new(
                dates.clone().zip(performance.strategy_equity().iter().copied()),
                &BLUE,
            ))
            .map_err(|e| Error::Plotters(e.to_string()))?
            .label(format!("Strategy (SMA {}/{})", config.fast(), config.slow()))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        chart
            .draw_series(LineSeries::new(
                dates.zip(performance.baseline_equity().iter().copied()),
                &RED,
            ))
            .map_err(|e| Error::Plotters(e.to_string()))?
            .label("Buy & Hold")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| Error::Plotters(e.to_string()))?;

        drawing_area.present().map_err(|e| Error::Plotters(e.to_string()))
    }
}
