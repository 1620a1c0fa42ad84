use std::fmt;

use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Parameters of one backtest run.
///
/// Every run receives its own value, so independent backtests never share settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    ticker: String,
    start: NaiveDate,
    fast: usize,
    slow: usize,
    cost: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ticker: "NVDA".to_string(),
            start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            fast: 50,
            slow: 200,
            cost: 0.001,
        }
    }
}

impl Config {
    /// Sets the instrument identifier.
    pub fn ticker(mut self, ticker: impl ToString) -> Self {
        self.ticker = ticker.to_string();
        self
    }

    /// Sets the first date taken into account.
    pub fn start(mut self, start: NaiveDate) -> Self {
        self.start = start;
        self
    }

    /// Sets the short and long moving-average windows.
    pub fn windows(mut self, fast: usize, slow: usize) -> Self {
        self.fast = fast;
        self.slow = slow;
        self
    }

    /// Sets the cost rate charged per position change (e.g., 0.001 for 0.1%).
    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Returns the instrument identifier.
    pub fn ticker_name(&self) -> &str {
        &self.ticker
    }

    /// Returns the start date.
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Returns the short window.
    pub fn fast(&self) -> usize {
        self.fast
    }

    /// Returns the long window.
    pub fn slow(&self) -> usize {
        self.slow
    }

    /// Returns the cost rate.
    pub fn cost_rate(&self) -> f64 {
        self.cost
    }

    /// Checks windows and cost rate.
    pub fn validate(&self) -> Result<()> {
        if self.fast == 0 || self.slow == 0 || self.fast >= self.slow {
            return Err(Error::InvalidWindow {
                fast: self.fast,
                slow: self.slow,
            });
        }
        if !(0.0..=1.0).contains(&self.cost) {
            return Err(Error::InvalidCostRate(self.cost));
        }
        Ok(())
    }

    /// Name under which the signal rows of this run are stored.
    pub fn table_name(&self) -> String {
        format!("backtest_{}_{}_{}", self.ticker.to_lowercase(), self.fast, self.slow)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticker={} Start={} Fast={} Slow={} Cost={:.3}%",
            self.ticker,
            self.start,
            self.fast,
            self.slow,
            self.cost * 100.0
        )
    }
}
