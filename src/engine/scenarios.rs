use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use super::*;
use crate::errors::Error;
use crate::metrics::{Performance, max_underwater_run};
use crate::utils::generate_sample_prices;

fn get_data(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
    let prices = closes
        .iter()
        .enumerate()
        .map(|(i, close)| (start + Days::new(i as u64), *close))
        .collect();
    PriceSeries::new(prices).unwrap()
}

fn config(fast: usize, slow: usize, cost: f64) -> Config {
    Config::default()
        .ticker("TEST")
        .start(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
        .windows(fast, slow)
        .cost(cost)
}

#[test]
fn scenario_crossover_without_costs() {
    let bt = Backtest::new(get_data(&[100.0, 105.0, 103.0, 110.0]), config(1, 2, 0.0)).unwrap();
    let report = bt.run().unwrap();

    let position = report.rows().iter().map(|r| r.position()).collect::<Vec<_>>();
    assert_eq!(position, vec![Exposure::Flat, Exposure::Flat, Exposure::Long, Exposure::Flat]);
    assert_eq!(report.trades(), 2);

    // Long only on bar 2: 105 -> 103
    let performance = report.performance();
    assert_eq!(performance.costs(), &[0.0; 4]);
    assert_eq!(performance.strategy_returns()[2], Some(103.0 / 105.0 - 1.0));
    assert_eq!(performance.strategy_returns()[3], Some(0.0));
    assert_eq!(report.perf().final_equity(), 1.0 + (103.0 / 105.0 - 1.0));
    assert_eq!(performance.baseline_final_equity(), performance.baseline_equity()[3]);
}

#[test]
fn scenario_constant_prices() {
    let bt = Backtest::new(get_data(&[50.0; 30]), config(2, 5, 0.0)).unwrap();
    let perf = *bt.run().unwrap().perf();
    assert_eq!(perf.sharpe(), None);
    assert_eq!(perf.final_equity(), 1.0);
    assert_eq!(perf.max_dd(), 0.0);
    assert_eq!(perf.max_dd_days(), 0);
    assert_eq!(perf.cagr(), None);
}

#[test]
fn scenario_flip_every_bar_with_costs() {
    use Exposure::*;

    let position = [Flat, Long, Flat, Long];
    let costs = compute_costs(&position, 0.01);
    assert_eq!(costs, vec![0.0, 0.01, 0.01, 0.01]);

    let returns = [None, Some(0.0), Some(0.0), Some(0.0)];
    let performance = Performance::compute(&position, &returns, &costs).unwrap();
    let expected = 0.99f64 * 0.99 * 0.99;
    assert!((performance.perf().final_equity() - expected).abs() < 1e-12);
    assert_eq!(performance.perf().max_dd_days(), 3);
}

#[test]
fn scenario_short_history_has_no_cagr() {
    let series = generate_sample_prices(101, 11, 100.0).unwrap();
    let config = config(5, 20, 0.001).start(series.first_date().unwrap());
    let report = Backtest::new(series, config).unwrap().run().unwrap();
    let returns = report.performance().strategy_returns().iter().flatten().count();
    assert_eq!(returns, 100);
    assert_eq!(report.perf().cagr(), None);
}

#[test]
fn scenario_long_history_has_cagr() {
    let series = generate_sample_prices(800, 5, 100.0).unwrap();
    let config = config(10, 50, 0.001).start(series.first_date().unwrap());
    let report = Backtest::new(series, config).unwrap().run().unwrap();
    let perf = report.perf();
    let expected = perf.final_equity().powf(252.0 / 799.0) - 1.0;
    assert_eq!(perf.cagr(), Some(expected));
}

#[test]
fn scenario_start_date_trims_history() {
    let series = get_data(&[10.0, 11.0, 12.0, 13.0, 14.0]);
    let start = NaiveDate::from_ymd_opt(2015, 6, 3).unwrap();
    let bt = Backtest::new(series, config(1, 2, 0.0).start(start)).unwrap();
    assert_eq!(bt.series().len(), 3);
    assert_eq!(bt.series().first_date(), Some(start));
    assert_eq!(bt.run().unwrap().rows()[0].ret(), None);
}

#[test]
fn scenario_start_date_after_history() {
    let series = get_data(&[10.0, 11.0]);
    let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let result = Backtest::new(series, config(1, 2, 0.0).start(start));
    assert!(matches!(result, Err(Error::InsufficientData)));
}

#[test]
fn scenario_invalid_config() {
    let series = get_data(&[10.0, 11.0]);
    assert!(matches!(
        Backtest::new(series.clone(), config(5, 5, 0.0)),
        Err(Error::InvalidWindow { fast: 5, slow: 5 })
    ));
    assert!(matches!(
        Backtest::new(series, config(1, 2, -1.0)),
        Err(Error::InvalidCostRate(_))
    ));
}

#[test]
fn scenario_runs_are_identical() {
    let series = generate_sample_prices(600, 21, 80.0).unwrap();
    let config = config(20, 60, 0.002).start(series.first_date().unwrap());
    let bt = Backtest::new(series, config).unwrap();
    assert_eq!(bt.run().unwrap(), bt.run().unwrap());
}

#[test]
fn scenario_independent_configs() {
    let series = generate_sample_prices(500, 2, 100.0).unwrap();
    let start = series.first_date().unwrap();
    let a = Backtest::new(series.clone(), config(5, 20, 0.001).start(start)).unwrap();
    let b = Backtest::new(series, config(10, 40, 0.0).start(start)).unwrap();
    let (ra, rb) = (a.run().unwrap(), b.run().unwrap());
    assert_eq!(ra.config().fast(), 5);
    assert_eq!(rb.config().fast(), 10);
    assert_eq!(ra, a.run().unwrap());
}

proptest! {
    #[test]
    fn zero_cost_strategy_is_position_times_return(seed in 0u64..500, len in 2usize..300) {
        let series = generate_sample_prices(len, seed, 100.0).unwrap();
        let config = config(3, 12, 0.0).start(series.first_date().unwrap());
        let report = Backtest::new(series, config).unwrap().run().unwrap();
        let performance = report.performance();

        prop_assert!(performance.costs().iter().all(|c| *c == 0.0));
        for (row, strategy) in report.rows().iter().zip(performance.strategy_returns()) {
            prop_assert_eq!(*strategy, row.ret().map(|r| row.position().as_f64() * r));
        }
    }

    #[test]
    fn drawdown_is_never_positive(seed in 0u64..500, len in 1usize..300, cost in 0.0f64..0.01) {
        let series = generate_sample_prices(len, seed, 100.0).unwrap();
        let config = config(2, 9, cost).start(series.first_date().unwrap());
        let report = Backtest::new(series, config).unwrap().run().unwrap();
        let performance = report.performance();
        let drawdown = performance.drawdown();

        prop_assert!(drawdown.iter().all(|dd| *dd <= 0.0));
        let min = drawdown.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert_eq!(report.perf().max_dd(), min);
        prop_assert!(report.perf().max_dd() <= 0.0);
        prop_assert_eq!(report.perf().max_dd_days(), max_underwater_run(drawdown));
    }

    #[test]
    fn longest_underwater_run(drawdown in prop::collection::vec(prop_oneof![Just(0.0), -1.0f64..-0.0001], 0..100)) {
        let mut longest = 0;
        for start in 0..drawdown.len() {
            let run = drawdown[start..].iter().take_while(|dd| **dd < 0.0).count();
            longest = longest.max(run);
        }
        prop_assert_eq!(max_underwater_run(&drawdown), longest);
    }

    #[test]
    fn rising_equity_is_never_underwater(returns in prop::collection::vec(0.0f64..0.05, 1..100)) {
        let returns = returns.into_iter().map(Some).collect::<Vec<_>>();
        let position = vec![Exposure::Long; returns.len()];
        let costs = vec![0.0; returns.len()];
        let performance = Performance::compute(&position, &returns, &costs).unwrap();
        prop_assert_eq!(performance.perf().max_dd_days(), 0);
        prop_assert_eq!(performance.perf().max_dd(), 0.0);
    }
}
