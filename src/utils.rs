use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::engine::PriceSeries;
use crate::errors::Result;

#[cfg(feature = "serde")]
use serde::Deserialize;

// [
//   { "date": "2024-01-02", "close": 48.168 },
//   { "date": "2024-01-03", "close": 47.569 }
// ]

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Deserialize)]
struct PriceRecord {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Close", alias = "close_price")]
    close: f64,
}

#[cfg(feature = "serde")]
/// Reads daily closes from the JSON file at `filepath` and returns a `PriceSeries`.
///
/// The file holds an array of `{ "date": "YYYY-MM-DD", "close": f64 }` objects, oldest first.
pub fn get_data_from_file(filepath: impl AsRef<std::path::Path>) -> Result<PriceSeries> {
    use std::{fs::File, io::BufReader};

    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    let records: Vec<PriceRecord> = serde_json::from_reader(reader)?;
    PriceSeries::new(records.into_iter().map(|r| (r.date, r.close)).collect())
}

#[cfg(feature = "serde")]
/// Writes the signal rows as a JSON array to `filepath`.
pub fn save_rows_to_file(filepath: impl AsRef<std::path::Path>, rows: &[crate::engine::SignalRow]) -> Result<()> {
    use std::{fs::File, io::BufWriter, io::Write};

    let file = File::create(filepath)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.flush()?;
    Ok(())
}

/// Generates `len` deterministic daily closes on consecutive weekdays from 2020-01-01.
///
/// The closes follow a seeded random walk around a slow upward drift, starting at `base_price`.
pub fn generate_sample_prices(len: usize, seed: u64, base_price: f64) -> Result<PriceSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    let mut close = base_price;

    let prices = (0..len)
        .map(|i| {
            while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date = date + Days::new(1);
            }
            if i > 0 {
                // Drift plus noise, floored so the close stays positive
                let change = 0.0004 + rng.random_range(-0.02..0.02);
                close = (close * (1.0 + change)).max(0.01);
            }
            let point = (date, close);
            date = date + Days::new(1);
            point
        })
        .collect();

    PriceSeries::new(prices)
}
