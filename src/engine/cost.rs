use super::Exposure;

/// Charges `rate` of notional each time the position changes.
///
/// The first bar is charged against an implicit flat position, so entering on bar 0
/// costs `rate` and a full round trip costs `2 * rate`.
pub fn compute_costs(position: &[Exposure], rate: f64) -> Vec<f64> {
    let mut previous = Exposure::Flat;
    position
        .iter()
        .map(|&current| {
            let cost = rate * (current.as_f64() - previous.as_f64()).abs();
            previous = current;
            cost
        })
        .collect()
}

/// Counts entries and exits in a position series.
pub fn trade_count(position: &[Exposure]) -> usize {
    let first = position.first().is_some_and(|p| p.is_long()) as usize;
    first + position.windows(2).filter(|w| w[0] != w[1]).count()
}
