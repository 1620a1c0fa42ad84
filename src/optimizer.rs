//! Window parameter optimization.
//!
//! This module runs the crossover backtest over many `(fast, slow)` window pairs in parallel.
//! The `Optimizer` struct handles the execution of one backtest per combination, while the
//! `ParameterCombination` trait defines which combinations are tested.

use std::ops::RangeInclusive;

use crate::engine::{Backtest, Config, PriceSeries};
use crate::errors::Result;
use crate::metrics::Perf;

use rayon::prelude::*;
use tracing::debug;

/// Trait defining how to generate window combinations for optimization.
pub trait ParameterCombination: Sync {
    /// Generates all `(fast, slow)` window pairs to test.
    ///
    /// # Returns
    /// A vector containing all window pairs.
    fn generate(&self) -> Vec<(usize, usize)>;
}

/// Cartesian grid of fast and slow windows, keeping only pairs with `fast < slow`.
#[derive(Debug, Clone)]
pub struct WindowGrid {
    fast: RangeInclusive<usize>,
    slow: RangeInclusive<usize>,
    step: usize,
}

impl WindowGrid {
    /// Creates a grid stepping through both ranges by `step` (at least 1).
    pub fn new(fast: RangeInclusive<usize>, slow: RangeInclusive<usize>, step: usize) -> Self {
        Self {
            fast,
            slow,
            step: step.max(1),
        }
    }
}

impl ParameterCombination for WindowGrid {
    fn generate(&self) -> Vec<(usize, usize)> {
        self.fast
            .clone()
            .step_by(self.step)
            .filter(|fast| *fast > 0)
            .flat_map(|fast| {
                self.slow
                    .clone()
                    .step_by(self.step)
                    .filter(move |slow| fast < *slow)
                    .map(move |slow| (fast, slow))
            })
            .collect()
    }
}

/// Optimizer running the same backtest with different windows.
///
/// Every combination gets its own `Config` derived from the base one; only the prices are shared.
pub struct Optimizer {
    series: PriceSeries,
    config: Config,
}

impl From<&Backtest> for Optimizer {
    fn from(value: &Backtest) -> Self {
        Self {
            series: value.series().clone(),
            config: value.config().clone(),
        }
    }
}

impl Optimizer {
    /// Creates a new `Optimizer` with the given prices and base configuration.
    ///
    /// # Arguments
    /// * `series` - Historical prices for backtesting.
    /// * `config` - Ticker, start date and cost rate shared by all runs. Its windows are replaced.
    pub fn new(series: &PriceSeries, config: Config) -> Self {
        Self {
            series: series.clone(),
            config,
        }
    }

    /// Runs one backtest per window pair and returns each pair with its statistics, in grid order.
    ///
    /// # Errors
    /// Returns the first error raised by a backtest.
    pub fn with<PC: ParameterCombination>(&self, combinator: &PC) -> Result<Vec<((usize, usize), Perf)>> {
        let num_cpus = num_cpus::get();
        let combinations = combinator.generate();
        let chunk_size = combinations.len().div_ceil(num_cpus).max(1);

        combinations
            .par_chunks(chunk_size)
            .map::<_, Result<_>>(|par_combinations| {
                let mut local_results = Vec::with_capacity(par_combinations.len());

                for &(fast, slow) in par_combinations {
                    let config = self.config.clone().windows(fast, slow);
                    let report = Backtest::new(self.series.clone(), config)?.run()?;
                    debug!(fast, slow, final_equity = report.perf().final_equity(), "combination tested");
                    local_results.push(((fast, slow), *report.perf()));
                }

                Ok(local_results)
            })
            .collect::<Result<Vec<_>>>()
            .map(|chunks| chunks.into_iter().flatten().collect())
    }
}

/// Returns the combination with the highest Sharpe ratio, ignoring undefined ones.
pub fn best_by_sharpe(results: &[((usize, usize), Perf)]) -> Option<&((usize, usize), Perf)> {
    results
        .iter()
        .filter(|(_, perf)| perf.sharpe().is_some())
        .max_by(|(_, a), (_, b)| a.sharpe().partial_cmp(&b.sharpe()).unwrap_or(std::cmp::Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_sample_prices;

    #[test]
    fn grid_keeps_ordered_pairs() {
        let grid = WindowGrid::new(0..=3, 2..=4, 1);
        assert_eq!(grid.generate(), vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)]);
    }

    #[test]
    fn grid_with_step() {
        let grid = WindowGrid::new(10..=30, 20..=60, 20);
        assert_eq!(grid.generate(), vec![(10, 20), (10, 40), (10, 60), (30, 40), (30, 60)]);
    }

    #[test]
    fn optimizer_matches_single_runs() {
        let series = generate_sample_prices(400, 9, 100.0).unwrap();
        let config = Config::default().start(series.first_date().unwrap());
        let grid = WindowGrid::new(5..=15, 20..=40, 5);

        let results = Optimizer::new(&series, config.clone()).with(&grid).unwrap();
        assert_eq!(results.len(), grid.generate().len());

        for ((fast, slow), perf) in &results {
            let single = Backtest::new(series.clone(), config.clone().windows(*fast, *slow))
                .unwrap()
                .run()
                .unwrap();
            assert_eq!(single.perf(), perf);
        }

        assert!(best_by_sharpe(&results).is_some());
    }

    #[test]
    fn optimizer_from_backtest() {
        let series = generate_sample_prices(100, 1, 100.0).unwrap();
        let config = Config::default().start(series.first_date().unwrap()).windows(2, 5);
        let bt = Backtest::new(series, config).unwrap();
        let results = Optimizer::from(&bt).with(&WindowGrid::new(2..=2, 5..=5, 1)).unwrap();
        assert_eq!(results, vec![((2, 5), *bt.run().unwrap().perf())]);
    }

    #[test]
    fn empty_grid() {
        let series = generate_sample_prices(10, 1, 100.0).unwrap();
        let results = Optimizer::new(&series, Config::default()).with(&WindowGrid::new(5..=5, 1..=5, 1));
        assert!(results.unwrap().is_empty());
    }
}
