//! Core backtesting components.
//!
//! This module provides the fundamental pieces of the pipeline:
//! - `PriceSeries`: Ordered daily closes and simple returns.
//! - `compute_signals`: Dual moving averages, crossover signal and next-bar position.
//! - `compute_costs`: Proportional cost charged on each position change.
//! - `Config`: Parameters of one run.
//! - `Backtest`: Runs the whole pipeline and returns a `Report`.

mod config;
mod cost;
mod series;
mod signal;

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::metrics::{Perf, Performance};

pub use config::*;
pub use cost::*;
pub use series::*;
pub use signal::*;

#[cfg(test)]
mod scenarios;

/// Output of a backtest run: the signal rows and the performance of the strategy.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    config: Config,
    rows: Vec<SignalRow>,
    performance: Performance,
}

impl Report {
    /// Returns the configuration the report was produced with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the signal rows.
    pub fn rows(&self) -> &[SignalRow] {
        &self.rows
    }

    /// Returns the equity curves and per-bar series.
    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    /// Returns the summary statistics.
    pub fn perf(&self) -> &Perf {
        self.performance.perf()
    }

    /// Returns the number of entries and exits.
    pub fn trades(&self) -> usize {
        let position = self.rows.iter().map(SignalRow::position).collect::<Vec<_>>();
        trade_count(&position)
    }
}

/// Moving-average crossover backtest of one price series.
#[derive(Debug, Clone)]
pub struct Backtest {
    series: PriceSeries,
    config: Config,
}

impl Backtest {
    /// Creates a new backtest instance.
    ///
    /// ### Arguments
    /// * `series` - Daily prices of the instrument.
    /// * `config` - Windows, cost rate and start date. Observations before the start date are dropped.
    ///
    /// ### Returns
    /// The new backtest instance or an error.
    ///
    /// ### Example
    /// ```rust
    /// use smacross::prelude::*;
    ///
    /// let series = generate_sample_prices(400, 7, 100.0).unwrap();
    /// let config = Config::default().windows(10, 30).start(series.first_date().unwrap());
    /// let report = Backtest::new(series, config).unwrap().run().unwrap();
    /// assert_eq!(report.rows().len(), 400);
    /// ```
    pub fn new(series: PriceSeries, config: Config) -> Result<Self> {
        config.validate()?;

        let series = match series.first_date() {
            Some(first) if first >= config.start_date() => series,
            _ => series.since(config.start_date()).inspect_err(|_| {
                warn!(start = %config.start_date(), "no observation on or after the start date");
            })?,
        };

        Ok(Self { series, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the price series used by the run.
    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    /// Runs signals, costs and performance in sequence.
    pub fn run(&self) -> Result<Report> {
        let config = &self.config;
        let rows = compute_signals(&self.series, config.fast(), config.slow())?;
        let position = rows.iter().map(SignalRow::position).collect::<Vec<_>>();
        let returns = rows.iter().map(SignalRow::ret).collect::<Vec<_>>();
        debug!(
            ticker = config.ticker_name(),
            bars = rows.len(),
            long_bars = position.iter().filter(|p| p.is_long()).count(),
            "signals computed"
        );

        let costs = compute_costs(&position, config.cost_rate());
        let performance = Performance::compute(&position, &returns, &costs)?;

        let perf = performance.perf();
        info!(
            ticker = config.ticker_name(),
            fast = config.fast(),
            slow = config.slow(),
            final_equity = perf.final_equity(),
            max_dd = perf.max_dd(),
            "backtest complete"
        );

        Ok(Report {
            config: config.clone(),
            rows,
            performance,
        })
    }
}
