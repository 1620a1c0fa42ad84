//! Performance metrics for backtesting.
//!
//! This module turns a position series, the market returns and the transaction costs into:
//! - Strategy and buy-and-hold equity curves
//! - CAGR
//! - Sharpe ratio
//! - Max drawdown and its duration
//!
//! Statistics that cannot be computed on the given history are `None`, never `NaN`.

use std::fmt;

use crate::engine::Exposure;
use crate::errors::{Error, Result};

/// Trading days in a year, used to annualize.
pub const TRADING_DAYS: f64 = 252.0;

/// Summary statistics of a strategy run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perf {
    final_equity: f64,
    cagr: Option<f64>,
    sharpe: Option<f64>,
    max_dd: f64,
    max_dd_days: usize,
}

impl Perf {
    /// Returns the last value of the strategy equity curve (starting from 1.0).
    pub fn final_equity(&self) -> f64 {
        self.final_equity
    }

    /// Returns the compound annual growth rate, `None` on one year of history or less.
    pub fn cagr(&self) -> Option<f64> {
        self.cagr
    }

    /// Returns the annualized Sharpe ratio (risk-free rate = 0), `None` when returns do not vary.
    pub fn sharpe(&self) -> Option<f64> {
        self.sharpe
    }

    /// Returns the deepest drawdown as a fraction (always `<= 0`).
    pub fn max_dd(&self) -> f64 {
        self.max_dd
    }

    /// Returns the longest run of consecutive bars spent under a previous peak.
    pub fn max_dd_days(&self) -> usize {
        self.max_dd_days
    }
}

impl fmt::Display for Perf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Results ===")?;
        writeln!(f, "Final equity: {:.3}", self.final_equity)?;
        if let Some(cagr) = self.cagr {
            writeln!(f, "CAGR: {:.2}%", cagr * 100.0)?;
        }
        if let Some(sharpe) = self.sharpe {
            writeln!(f, "Sharpe (ann.): {:.2}", sharpe)?;
        }
        write!(
            f,
            "Max drawdown: {:.2}% (duration: {} bars)",
            self.max_dd * 100.0,
            self.max_dd_days
        )
    }
}

/// Equity curves, per-bar series and summary statistics of a strategy run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    strategy_equity: Vec<f64>,
    baseline_equity: Vec<f64>,
    strategy_returns: Vec<Option<f64>>,
    costs: Vec<f64>,
    drawdown: Vec<f64>,
    perf: Perf,
}

impl Performance {
    /// Compounds the strategy and the buy-and-hold baseline and computes the statistics.
    ///
    /// `strategy_return[t] = position[t] * return[t] - cost[t]`, undefined where the market return is.
    /// The cost is charged on the bar where the new position takes effect.
    ///
    /// ### Errors
    /// * `LengthMismatch` if the three series do not have the same length.
    /// * `EmptySeries` if they are empty.
    pub fn compute(position: &[Exposure], returns: &[Option<f64>], costs: &[f64]) -> Result<Self> {
        if position.len() != returns.len() || position.len() != costs.len() {
            return Err(Error::LengthMismatch(position.len(), returns.len(), costs.len()));
        }
        if position.is_empty() {
            return Err(Error::EmptySeries);
        }

        let strategy_returns = position
            .iter()
            .zip(returns)
            .zip(costs)
            .map(|((p, r), c)| r.map(|r| p.as_f64() * r - c))
            .collect::<Vec<_>>();

        let strategy_equity = equity_curve(&strategy_returns);
        let baseline_equity = equity_curve(returns);
        let drawdown = drawdown(&strategy_equity);

        let daily = strategy_returns.iter().flatten().copied().collect::<Vec<_>>();
        let final_equity = strategy_equity.last().copied().ok_or(Error::EmptySeries)?;

        let perf = Perf {
            final_equity,
            cagr: cagr(final_equity, daily.len()),
            sharpe: sharpe_ratio(&daily),
            max_dd: drawdown.iter().copied().fold(0.0, f64::min),
            max_dd_days: max_underwater_run(&drawdown),
        };

        Ok(Self {
            strategy_equity,
            baseline_equity,
            strategy_returns,
            costs: costs.to_vec(),
            drawdown,
            perf,
        })
    }

    /// Returns the strategy equity curve.
    pub fn strategy_equity(&self) -> &[f64] {
        &self.strategy_equity
    }

    /// Returns the buy-and-hold equity curve.
    pub fn baseline_equity(&self) -> &[f64] {
        &self.baseline_equity
    }

    /// Returns the net strategy returns.
    pub fn strategy_returns(&self) -> &[Option<f64>] {
        &self.strategy_returns
    }

    /// Returns the cost charged on each bar.
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Returns the strategy drawdown on each bar.
    pub fn drawdown(&self) -> &[f64] {
        &self.drawdown
    }

    /// Returns the summary statistics.
    pub fn perf(&self) -> &Perf {
        &self.perf
    }

    /// Returns the last value of the buy-and-hold equity curve.
    pub fn baseline_final_equity(&self) -> f64 {
        self.baseline_equity.last().copied().unwrap_or(1.0)
    }
}

/// Compounds `returns` from 1.0, undefined returns counting as zero.
pub fn equity_curve(returns: &[Option<f64>]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |equity, r| {
            *equity *= 1.0 + r.unwrap_or(0.0);
            Some(*equity)
        })
        .collect()
}

/// Fractional distance of each equity value below its running peak.
///
/// A peak that is not positive means the equity was wiped out: the drawdown is `-1.0`.
pub fn drawdown(equity: &[f64]) -> Vec<f64> {
    equity
        .iter()
        .scan(f64::NEG_INFINITY, |peak, &e| {
            *peak = peak.max(e);
            Some(if *peak > 0.0 { e / *peak - 1.0 } else { -1.0 })
        })
        .collect()
}

/// Longest run of consecutive bars with a strictly negative drawdown.
pub fn max_underwater_run(drawdown: &[f64]) -> usize {
    drawdown
        .iter()
        .fold((0, 0), |(current, longest), &dd| {
            let current = if dd < 0.0 { current + 1 } else { 0 };
            (current, longest.max(current))
        })
        .1
}

/// Annualized growth of `final_equity` over `n` daily returns.
///
/// Only computed on more than one year of history.
pub fn cagr(final_equity: f64, n: usize) -> Option<f64> {
    if (n as f64) <= TRADING_DAYS {
        return None;
    }
    let cagr = final_equity.powf(TRADING_DAYS / n as f64) - 1.0;
    cagr.is_finite().then_some(cagr)
}

/// Annualized Sharpe ratio of daily returns, using the sample standard deviation.
///
/// Undefined for fewer than two returns or when every return is the same.
pub fn sharpe_ratio(returns: &[f64]) -> Option<f64> {
    let first = *returns.first()?;
    if returns.len() < 2 || returns.iter().all(|r| *r == first) {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    (std_dev > 0.0).then(|| mean / std_dev * TRADING_DAYS.sqrt())
}

#[cfg(test)]
use Exposure::{Flat, Long};

#[cfg(test)]
fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[cfg(test)]
#[test]
fn flat_market() {
    let returns = std::iter::once(None).chain(std::iter::repeat_n(Some(0.0), 9)).collect::<Vec<_>>();
    let position = [Flat, Long, Long, Flat, Long, Long, Long, Flat, Flat, Long];
    let performance = Performance::compute(&position, &returns, &[0.0; 10]).unwrap();
    let perf = performance.perf();
    assert_eq!(perf.final_equity(), 1.0);
    assert_eq!(perf.sharpe(), None);
    assert_eq!(perf.max_dd(), 0.0);
    assert_eq!(perf.max_dd_days(), 0);
}

#[cfg(test)]
#[test]
fn no_cagr_under_a_year() {
    let returns = std::iter::once(None).chain(std::iter::repeat_n(Some(0.01), 100)).collect::<Vec<_>>();
    let position = vec![Long; returns.len()];
    let costs = vec![0.0; returns.len()];
    let performance = Performance::compute(&position, &returns, &costs).unwrap();
    assert!(performance.perf().final_equity() > 2.0);
    assert_eq!(performance.perf().cagr(), None);
}

#[cfg(test)]
#[test]
fn cagr_over_two_years() {
    let returns = std::iter::once(None).chain(std::iter::repeat_n(Some(0.001), 504)).collect::<Vec<_>>();
    let position = vec![Long; returns.len()];
    let costs = vec![0.0; returns.len()];
    let performance = Performance::compute(&position, &returns, &costs).unwrap();
    let cagr = performance.perf().cagr().unwrap();
    assert!((cagr - (1.001f64.powi(252) - 1.0)).abs() < 1e-9);
}

#[cfg(test)]
#[test]
fn cagr_with_wiped_out_equity() {
    assert_eq!(cagr(-0.5, 300), None);
    assert_eq!(cagr(1.0, 252), None);
    assert_eq!(cagr(1.0, 253), Some(0.0));
}

#[cfg(test)]
#[test]
fn drawdown_and_duration() {
    let returns = [None, Some(0.2), Some(-0.25), Some(0.1), Some(0.3)];
    let position = [Long; 5];
    let performance = Performance::compute(&position, &returns, &[0.0; 5]).unwrap();
    let equity = performance.strategy_equity();
    assert!(approx(equity[1], 1.2));
    assert!(approx(equity[2], 0.9));

    let perf = performance.perf();
    assert!(approx(perf.max_dd(), -0.25));
    assert_eq!(perf.max_dd_days(), 2);
    assert!(performance.drawdown().iter().all(|dd| *dd <= 0.0));
}

#[cfg(test)]
#[test]
fn underwater_run_resets_at_new_peak() {
    let drawdown = [0.0, -0.1, -0.2, 0.0, -0.1, -0.1, -0.1, 0.0, -0.3];
    assert_eq!(max_underwater_run(&drawdown), 3);
    assert_eq!(max_underwater_run(&[0.0, 0.0, 0.0]), 0);
    assert_eq!(max_underwater_run(&[]), 0);
}

#[cfg(test)]
#[test]
fn costs_hit_strategy_returns() {
    let returns = [None, Some(0.01), Some(0.02), Some(-0.01)];
    let position = [Flat, Long, Flat, Long];
    let costs = [0.0, 0.01, 0.01, 0.01];
    let performance = Performance::compute(&position, &returns, &costs).unwrap();
    let strategy_returns = performance.strategy_returns();
    assert_eq!(strategy_returns[0], None);
    assert_eq!(strategy_returns[1], Some(0.01 - 0.01));
    assert_eq!(strategy_returns[2], Some(-0.01));
    assert_eq!(strategy_returns[3], Some(-0.01 - 0.01));
}

#[cfg(test)]
#[test]
fn baseline_holds_from_day_zero() {
    let returns = [None, Some(0.1), Some(-0.1)];
    let performance = Performance::compute(&[Flat; 3], &returns, &[0.0; 3]).unwrap();
    assert_eq!(performance.strategy_equity(), &[1.0, 1.0, 1.0]);
    assert_eq!(performance.baseline_equity(), &[1.0, 1.1, 1.1 * 0.9]);
    assert_eq!(performance.baseline_final_equity(), 1.1 * 0.9);
}

#[cfg(test)]
#[test]
fn sharpe_ratio_sample_std() {
    let returns = [0.01, -0.02, 0.03, 0.0];
    let mean = 0.005;
    let std_dev = ((0.005f64.powi(2) + 0.025f64.powi(2) + 0.025f64.powi(2) + 0.005f64.powi(2)) / 3.0).sqrt();
    let sharpe = sharpe_ratio(&returns).unwrap();
    assert!((sharpe - mean / std_dev * 252f64.sqrt()).abs() < 1e-9);
}

#[cfg(test)]
#[test]
fn sharpe_ratio_undefined() {
    assert_eq!(sharpe_ratio(&[]), None);
    assert_eq!(sharpe_ratio(&[0.01]), None);
    assert_eq!(sharpe_ratio(&[0.25, 0.25, 0.25]), None);
    assert_eq!(sharpe_ratio(&[0.1; 3]), None);
    assert_eq!(sharpe_ratio(&[-0.003; 40]), None);
}

#[cfg(test)]
#[test]
fn constant_growth_has_no_sharpe() {
    let returns = std::iter::once(None).chain(std::iter::repeat_n(Some(0.001), 299)).collect::<Vec<_>>();
    let position = vec![Long; returns.len()];
    let performance = Performance::compute(&position, &returns, &vec![0.0; returns.len()]).unwrap();
    assert_eq!(performance.perf().sharpe(), None);
    assert_eq!(performance.perf().max_dd(), 0.0);
    assert!(performance.perf().cagr().is_some());
}

#[cfg(test)]
#[test]
fn total_loss_on_first_bar() {
    let returns = [Some(-1.0), Some(0.05)];
    let performance = Performance::compute(&[Long, Long], &returns, &[0.0; 2]).unwrap();
    assert_eq!(performance.perf().final_equity(), 0.0);
    assert_eq!(performance.drawdown(), &[-1.0, -1.0]);
    assert_eq!(performance.perf().max_dd(), -1.0);
    assert_eq!(performance.perf().max_dd_days(), 2);
}

#[cfg(test)]
#[test]
fn wiped_out_after_a_peak() {
    assert_eq!(drawdown(&[1.0, 1.2, 0.0, 0.0]), vec![0.0, 0.0, -1.0, -1.0]);
}

#[cfg(test)]
#[test]
fn empty_series() {
    assert!(matches!(Performance::compute(&[], &[], &[]), Err(Error::EmptySeries)));
}

#[cfg(test)]
#[test]
fn misaligned_series() {
    let result = Performance::compute(&[Flat, Long], &[None], &[0.0, 0.0]);
    assert!(matches!(result, Err(Error::LengthMismatch(2, 1, 2))));
}

#[cfg(test)]
#[test]
fn console_summary() {
    let perf = Perf {
        final_equity: 2.5,
        cagr: None,
        sharpe: Some(0.8123),
        max_dd: -0.3456,
        max_dd_days: 42,
    };
    assert_eq!(
        perf.to_string(),
        "=== Results ===\nFinal equity: 2.500\nSharpe (ann.): 0.81\nMax drawdown: -34.56% (duration: 42 bars)"
    );
}
