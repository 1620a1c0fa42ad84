use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Observation;
use crate::errors::{Error, Result};

/// Market exposure on a bar: out of the market or fully long.
///
/// Serialized as `0` or `1`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exposure {
    /// Out of the market (`0`).
    #[default]
    Flat,
    /// Fully invested (`1`).
    Long,
}

impl Exposure {
    /// Returns `0.0` when flat and `1.0` when long.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Flat => 0.0,
            Self::Long => 1.0,
        }
    }

    /// Returns true when long.
    pub fn is_long(self) -> bool {
        self == Self::Long
    }
}

impl From<bool> for Exposure {
    fn from(long: bool) -> Self {
        if long { Self::Long } else { Self::Flat }
    }
}

impl From<Exposure> for u8 {
    fn from(exposure: Exposure) -> Self {
        exposure.is_long().into()
    }
}

impl TryFrom<u8> for Exposure {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Flat),
            1 => Ok(Self::Long),
            other => Err(Error::InvalidExposure(other)),
        }
    }
}

/// An observation enriched with both moving averages, the crossover signal and the held position.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRow {
    date: NaiveDate,
    close: f64,
    ret: Option<f64>,
    sma_fast: Option<f64>,
    sma_slow: Option<f64>,
    signal: Exposure,
    position: Exposure,
}

impl SignalRow {
    /// Returns the trading date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the simple return, `None` on the first bar.
    pub fn ret(&self) -> Option<f64> {
        self.ret
    }

    /// Returns the short moving average, `None` until the window is full.
    pub fn sma_fast(&self) -> Option<f64> {
        self.sma_fast
    }

    /// Returns the long moving average, `None` until the window is full.
    pub fn sma_slow(&self) -> Option<f64> {
        self.sma_slow
    }

    /// Returns the signal computed at the close of this bar.
    pub fn signal(&self) -> Exposure {
        self.signal
    }

    /// Returns the position held during this bar (previous bar's signal).
    pub fn position(&self) -> Exposure {
        self.position
    }
}

/// Computes the simple moving average of `closes` over `window` bars.
///
/// Bars before the window is full are `None`, never a partial mean.
/// Each value is the left-to-right sum of its window divided by `window`.
pub fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; closes.len()];
    }

    let warmup = closes.len().min(window - 1);
    std::iter::repeat_n(None, warmup)
        .chain(
            closes
                .windows(window)
                .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
        )
        .collect()
}

/// Computes both moving averages, the crossover signal and the next-bar position.
///
/// `signal[t]` is long when both averages exist and the fast one is strictly above the slow one.
/// `position[t]` is `signal[t - 1]`, flat on the first bar, so a signal is only acted upon
/// on the bar after it is observed.
///
/// ### Errors
/// * `InvalidWindow` if a window is zero or `fast >= slow`.
/// * `InsufficientData` if `observations` is empty.
///
/// ### Example
/// ```rust
/// use smacross::prelude::*;
/// use chrono::{Days, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let prices = [100.0, 105.0, 103.0, 110.0]
///     .into_iter()
///     .enumerate()
///     .map(|(i, close)| (start + Days::new(i as u64), close))
///     .collect();
/// let series = PriceSeries::new(prices).unwrap();
///
/// let rows = compute_signals(&series, 1, 2).unwrap();
/// let positions = rows.iter().map(|r| r.position().as_f64()).collect::<Vec<_>>();
/// assert_eq!(positions, vec![0.0, 0.0, 1.0, 0.0]);
/// ```
pub fn compute_signals(observations: &[Observation], fast: usize, slow: usize) -> Result<Vec<SignalRow>> {
    if fast == 0 || slow == 0 || fast >= slow {
        return Err(Error::InvalidWindow { fast, slow });
    }
    if observations.is_empty() {
        return Err(Error::InsufficientData);
    }

    let closes = observations.iter().map(Observation::close).collect::<Vec<_>>();
    let sma_fast = sma(&closes, fast);
    let sma_slow = sma(&closes, slow);

    let mut previous_signal = Exposure::Flat;
    let rows = observations
        .iter()
        .zip(sma_fast)
        .zip(sma_slow)
        .map(|((obs, sma_fast), sma_slow)| {
            let signal = match (sma_fast, sma_slow) {
                (Some(f), Some(s)) => Exposure::from(f > s),
                _ => Exposure::Flat,
            };
            let position = previous_signal;
            previous_signal = signal;
            SignalRow {
                date: obs.date(),
                close: obs.close(),
                ret: obs.ret(),
                sma_fast,
                sma_slow,
                signal,
                position,
            }
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PriceSeries;

    use chrono::Days;
    use proptest::prelude::*;
    use ta::{Next, indicators::SimpleMovingAverage};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let prices = closes
            .iter()
            .enumerate()
            .map(|(i, c)| (start + Days::new(i as u64), *c))
            .collect();
        PriceSeries::new(prices).unwrap()
    }

    #[test]
    fn crossover_on_four_bars() {
        let rows = compute_signals(&series(&[100.0, 105.0, 103.0, 110.0]), 1, 2).unwrap();

        let fast = rows.iter().map(SignalRow::sma_fast).collect::<Vec<_>>();
        let slow = rows.iter().map(SignalRow::sma_slow).collect::<Vec<_>>();
        let signal = rows.iter().map(|r| r.signal()).collect::<Vec<_>>();
        let position = rows.iter().map(|r| r.position()).collect::<Vec<_>>();

        assert_eq!(fast, vec![Some(100.0), Some(105.0), Some(103.0), Some(110.0)]);
        assert_eq!(slow, vec![None, Some(102.5), Some(104.0), Some(106.5)]);
        use Exposure::*;
        assert_eq!(signal, vec![Flat, Long, Flat, Long]);
        assert_eq!(position, vec![Flat, Flat, Long, Flat]);
    }

    #[test]
    fn single_observation() {
        let rows = compute_signals(&series(&[42.0]), 2, 3).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sma_fast(), None);
        assert_eq!(rows[0].signal(), Exposure::Flat);
        assert_eq!(rows[0].position(), Exposure::Flat);
    }

    #[test]
    fn exposure_from_binary() {
        assert_eq!(Exposure::try_from(0u8).unwrap(), Exposure::Flat);
        assert_eq!(Exposure::try_from(1u8).unwrap(), Exposure::Long);
        assert!(matches!(Exposure::try_from(2u8), Err(Error::InvalidExposure(2))));
        assert_eq!(u8::from(Exposure::Long), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rows_serialize_exposure_as_binary() {
        let rows = compute_signals(&series(&[100.0, 105.0, 103.0, 110.0]), 1, 2).unwrap();
        let json = serde_json::to_value(rows[2]).unwrap();
        assert_eq!(json["signal"], 0);
        assert_eq!(json["position"], 1);
        assert!(serde_json::from_str::<Exposure>("\"Long\"").is_err());
        assert_eq!(serde_json::from_str::<Exposure>("1").unwrap(), Exposure::Long);
    }

    #[test]
    fn invalid_windows() {
        let data = series(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            compute_signals(&data, 3, 3),
            Err(Error::InvalidWindow { fast: 3, slow: 3 })
        ));
        assert!(matches!(compute_signals(&data, 5, 2), Err(Error::InvalidWindow { .. })));
        assert!(matches!(compute_signals(&data, 0, 2), Err(Error::InvalidWindow { .. })));
    }

    #[test]
    fn no_observations() {
        assert!(matches!(compute_signals(&[], 1, 2), Err(Error::InsufficientData)));
    }

    #[test]
    fn window_longer_than_history() {
        let values = sma(&[1.0, 2.0, 3.0], 5);
        assert_eq!(values, vec![None, None, None]);
    }

    #[test]
    fn sma_matches_ta_once_window_is_full() {
        let closes = (0..120).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect::<Vec<_>>();
        let window = 20;
        let mut indicator = SimpleMovingAverage::new(window).unwrap();
        let expected = closes.iter().map(|c| indicator.next(*c)).collect::<Vec<_>>();

        for (t, value) in sma(&closes, window).into_iter().enumerate() {
            match value {
                Some(v) => {
                    assert!(t >= window - 1);
                    assert!((v - expected[t]).abs() < 1e-9, "bar {t}: {v} != {}", expected[t]);
                }
                None => assert!(t < window - 1),
            }
        }
    }

    proptest! {
        #[test]
        fn position_is_previous_signal(
            closes in prop::collection::vec(1.0f64..500.0, 1..80),
            fast in 1usize..10,
            extra in 1usize..15,
        ) {
            let rows = compute_signals(&series(&closes), fast, fast + extra).unwrap();
            prop_assert_eq!(rows[0].position(), Exposure::Flat);
            for t in 1..rows.len() {
                prop_assert_eq!(rows[t].position(), rows[t - 1].signal());
            }
        }

        #[test]
        fn sma_is_trailing_mean(
            closes in prop::collection::vec(1.0f64..500.0, 1..60),
            window in 1usize..12,
        ) {
            let values = sma(&closes, window);
            prop_assert_eq!(values.len(), closes.len());
            for (t, value) in values.iter().enumerate() {
                if t + 1 < window {
                    prop_assert!(value.is_none());
                } else {
                    let mean = closes[t + 1 - window..=t].iter().sum::<f64>() / window as f64;
                    prop_assert_eq!(*value, Some(mean));
                }
            }
        }

        #[test]
        fn signals_are_deterministic(
            closes in prop::collection::vec(1.0f64..500.0, 1..60),
        ) {
            let data = series(&closes);
            prop_assert_eq!(compute_signals(&data, 3, 7).unwrap(), compute_signals(&data, 3, 7).unwrap());
        }
    }
}
