//! Robust univariate outlier scores.
//!
//! Inputs are complete columns (missing values already imputed). Two scores
//! are computed per value and the larger one wins:
//!
//! - robust z: distance from the median in scaled-MAD units
//! - IQR fence: distance past the Tukey fences in IQR units
//!
//! The winner is squashed through a logistic curve centred on
//! [`SIGMOID_CUTOFF`] so every score lands in `[0, 1]`.

use super::binning::{quantile, sort_values};
use super::{DENOM_EPSILON, IQR_FENCE, MAD_SCALE, SIGMOID_CUTOFF};

/// Median (mean of the two middle values for even lengths); `NaN` when empty.
pub fn median(values: &[f64]) -> f64 {
    quantile(&sort_values(values), 0.5)
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// `|x − median| / (1.4826 · MAD)`, or `/ (std + 1e-12)` when the MAD is zero.
pub fn robust_z(values: &[f64]) -> Vec<f64> {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);
    let denom = if mad > 0.0 {
        MAD_SCALE * mad
    } else {
        population_std(values) + DENOM_EPSILON
    };
    deviations.into_iter().map(|d| d / denom).collect()
}

/// Distance past `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]` in IQR units; zero inside.
///
/// Identically zero when the IQR is not positive.
pub fn iqr_score(values: &[f64]) -> Vec<f64> {
    let sorted = sort_values(values);
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    if !(iqr > 0.0) {
        return vec![0.0; values.len()];
    }

    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;
    values
        .iter()
        .map(|&x| {
            if x < lower {
                (lower - x) / (iqr + DENOM_EPSILON)
            } else if x > upper {
                (x - upper) / (iqr + DENOM_EPSILON)
            } else {
                0.0
            }
        })
        .collect()
}

/// Logistic squash centred on [`SIGMOID_CUTOFF`].
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-(x - SIGMOID_CUTOFF)).exp())
}

/// Squashed `max(robust_z, iqr_score)` for each value of a column.
pub fn combined_column_score(values: &[f64]) -> Vec<f64> {
    robust_z(values)
        .into_iter()
        .zip(iqr_score(values))
        .map(|(z, fence)| sigmoid(z.max(fence)))
        .collect()
}
