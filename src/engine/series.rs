use std::sync::Arc;

use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A single daily observation: close price and simple return from the previous close.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    date: NaiveDate,
    close: f64,
    ret: Option<f64>,
}

impl Observation {
    /// Returns the trading date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the simple return `close / previous close - 1`, or `None` on the first bar.
    pub fn ret(&self) -> Option<f64> {
        self.ret
    }
}

/// Ordered daily observations for one instrument.
///
/// Dates are strictly increasing and closes are positive, so every return is defined
/// except the first one. The series is immutable and cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    data: Arc<[Observation]>,
}

impl PriceSeries {
    /// Builds a series from `(date, close)` pairs and derives the simple returns.
    ///
    /// ### Errors
    /// * `InsufficientData` if `prices` is empty.
    /// * `UnorderedDates` if a date does not follow the previous one.
    /// * `InvalidPrice` if a close is not positive and finite.
    ///
    /// ### Example
    /// ```rust
    /// use smacross::prelude::*;
    /// use chrono::NaiveDate;
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
    /// let series = PriceSeries::new(vec![(day(2), 100.0), (day(3), 105.0)]).unwrap();
    /// assert_eq!(series.len(), 2);
    /// assert_eq!(series.returns()[0], None);
    /// ```
    pub fn new(prices: Vec<(NaiveDate, f64)>) -> Result<Self> {
        if prices.is_empty() {
            return Err(Error::InsufficientData);
        }

        let mut data = Vec::with_capacity(prices.len());
        let mut previous: Option<(NaiveDate, f64)> = None;
        for (index, (date, close)) in prices.into_iter().enumerate() {
            if close <= 0.0 || !close.is_finite() {
                return Err(Error::InvalidPrice(close));
            }
            let ret = match previous {
                Some((prev_date, _)) if date <= prev_date => return Err(Error::UnorderedDates(index)),
                Some((_, prev_close)) => Some(close / prev_close - 1.0),
                None => None,
            };
            data.push(Observation { date, close, ret });
            previous = Some((date, close));
        }

        Ok(Self { data: data.into() })
    }

    /// Keeps the observations dated on or after `start`.
    ///
    /// The first kept observation has no return, as if the history began there.
    pub fn since(&self, start: NaiveDate) -> Result<Self> {
        let prices = self
            .data
            .iter()
            .filter(|o| o.date >= start)
            .map(|o| (o.date, o.close))
            .collect::<Vec<_>>();
        Self::new(prices)
    }

    /// Returns the observations.
    pub fn observations(&self) -> &[Observation] {
        &self.data
    }

    /// Returns the close prices.
    pub fn closes(&self) -> Vec<f64> {
        self.data.iter().map(Observation::close).collect()
    }

    /// Returns the simple returns.
    pub fn returns(&self) -> Vec<Option<f64>> {
        self.data.iter().map(Observation::ret).collect()
    }

    /// Returns the number of observations.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a series holds at least one observation.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the first date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.data.first().map(Observation::date)
    }

    /// Returns the last date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.data.last().map(Observation::date)
    }
}

impl std::ops::Deref for PriceSeries {
    type Target = [Observation];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
