//! # SMACROSS: Moving-Average Crossover Backtesting
//!
//! **SMACROSS** evaluates a dual simple moving-average crossover strategy on daily closes
//! and compares it to buying and holding the same instrument.
//! Every computation is a pure function of its inputs: running the same backtest twice gives
//! bit-identical results, and independent backtests never share state.
//!
//! ## Core Components
//! | Component         | Description                                                                  |
//! |-------------------|------------------------------------------------------------------------------|
//! | **`PriceSeries`** | Ordered daily closes with their simple returns.                              |
//! | **`compute_signals`** | Fast and slow SMAs, binary in/out signal, position lagged by one bar.    |
//! | **`compute_costs`** | Proportional cost charged on each entry and exit.                          |
//! | **`Performance`** | Strategy and buy-and-hold equity curves, drawdown series and `Perf`.         |
//! | **`Config`**      | Ticker, start date, windows and cost rate of one run.                        |
//! | **`Backtest`**    | Runs the whole pipeline and returns a `Report`.                              |
//! | **`Optimizer`**   | Sweeps window pairs in parallel *(feature `optimizer`)*.                     |
//!
//! ## Performance Metrics
//! | Metric               | Description                                                              |
//! |----------------------|--------------------------------------------------------------------------|
//! | **Final Equity**     | Strategy equity at the last bar, starting from 1.0.                      |
//! | **CAGR**             | Annualized growth over 252 days/year, only on more than a year of data.  |
//! | **Sharpe Ratio**     | Mean over sample deviation of daily returns, times √252 (risk-free = 0). |
//! | **Max Drawdown**     | Deepest fall below a previous equity peak.                               |
//! | **Drawdown Duration**| Longest run of consecutive bars under a previous peak.                   |
//!
//! Statistics that cannot be computed are `None`, never `NaN`.
//!
//! ## Getting Started
//! ```rust
//! use smacross::prelude::*;
//!
//! let series = generate_sample_prices(1_000, 42, 100.0).unwrap();
//! let config = Config::default()
//!     .ticker("DEMO")
//!     .start(series.first_date().unwrap())
//!     .windows(20, 100)
//!     .cost(0.001);
//!
//! let report = Backtest::new(series, config).unwrap().run().unwrap();
//! let perf = report.perf();
//! assert!(perf.max_dd() <= 0.0);
//! assert!(perf.cagr().is_some());
//! println!("{}", perf);
//! ```
//!
//! ### Output (varies with the data):
//! ```bash
//! === Results ===
//! Final equity: 1.184
//! CAGR: 4.35%
//! Sharpe (ann.): 0.41
//! Max drawdown: -21.07% (duration: 388 bars)
//! ```
//!
//! ## Features
//! | Feature       | Purpose                                                                     |
//! |---------------|-----------------------------------------------------------------------------|
//! | `serde`       | Serialize results, load prices from JSON and save signal rows.              |
//! | `optimizer`   | Parallel window sweep with [`rayon`](https://crates.io/crates/rayon).       |
//! | `draws`       | Equity chart with [`plotters`](https://crates.io/crates/plotters).          |
//! | `cli`         | The `smacross` binary.                                                      |
//!
//! ## Error Handling
//! Invalid windows, empty or unordered data and negative cost rates are rejected
//! with an [`errors::Error`] before anything is computed.
//!
//! ## License
//! MIT
#![warn(missing_docs)]

/// Core backtesting components: prices, signals, costs, configuration and the backtest runner.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Utility functions and helpers.
mod utils;

/// Performance metrics: equity curves, CAGR, Sharpe ratio, drawdown.
pub mod metrics;

/// Window parameter optimization.
#[cfg(feature = "optimizer")]
pub mod optimizer;

/// Draw equity charts to png or svg.
#[cfg(feature = "draws")]
pub mod draws;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::metrics::*;
    pub use crate::utils::*;

    #[cfg(feature = "optimizer")]
    pub use crate::optimizer::*;

    #[cfg(feature = "draws")]
    pub use crate::draws::*;
}
