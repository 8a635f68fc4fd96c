//! Collapsing many per-column signals into one dataset-level number.

/// Mean of the non-`NaN` values; `NaN` when there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// `last − first` over the non-`NaN` values, if at least two exist.
pub fn trend(values: &[f64]) -> Option<f64> {
    let mut valid = values.iter().copied().filter(|v| !v.is_nan());
    let first = valid.next()?;
    let last = valid.last()?;
    Some(last - first)
}
