//! Small numeric helpers shared by the interval aggregator and the gene roll-up.
//! Every ratio here guards its denominator and falls back to `0.0`.

///
/// Arithmetic mean of `values`, optionally ignoring entries that are not
/// positive. Returns `0.0` when nothing is left to average.
///
pub fn mean(values: &[f64], skip_zeros: bool) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !skip_zeros || **v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count > 0 { sum / count as f64 } else { 0.0 }
}

/// `numerator / denominator`, or `0.0` for an empty denominator.
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

/// Counts per million of `total`, or `0.0` when `total` is zero.
pub fn per_million(count: u64, total: u64) -> f64 {
    if total > 0 {
        count as f64 * 1_000_000.0 / total as f64
    } else {
        0.0
    }
}
