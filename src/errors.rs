/// Result type of the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating inputs or handling files.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The moving-average windows are not usable: both must be positive and `fast < slow`.
    #[error("Invalid windows: fast ({fast}) must be positive and lower than slow ({slow})")]
    InvalidWindow {
        /// Short window length.
        fast: usize,
        /// Long window length.
        slow: usize,
    },

    /// The price data provided is empty. Signals require at least one observation.
    #[error("Price data is empty: computing signals requires at least one observation")]
    InsufficientData,

    /// The series handed to the performance computation is empty.
    #[error("Series is empty: performance requires at least one bar")]
    EmptySeries,

    /// Position, return and cost series are not aligned.
    #[error("Series length mismatch: positions {0}, returns {1}, costs {2}")]
    LengthMismatch(usize, usize, usize),

    /// Observation dates must be strictly increasing.
    #[error("Dates must be strictly increasing (at index {0})")]
    UnorderedDates(usize),

    /// A close price is zero, negative or not finite.
    #[error("Close price must be positive and finite (got: {0})")]
    InvalidPrice(f64),

    /// The transaction cost rate is outside `[0, 1]`.
    #[error("Cost rate must be between 0 and 1 (got: {0})")]
    InvalidCostRate(f64),

    /// An exposure is neither `0` nor `1`.
    #[error("Exposure must be 0 or 1 (got: {0})")]
    InvalidExposure(u8),

    /// I/O error occurred.
    // utils.rs
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Plotters error occurred.
    #[cfg(feature = "draws")]
    #[error("Plotters error: {0}")]
    Plotters(String),
}
