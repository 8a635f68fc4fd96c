//! Quantile binning shared by two samples.
//!
//! Both samples are histogrammed against the same edges, computed from their
//! concatenation, so that per-bin probabilities are directly comparable even
//! when the samples differ in size.

use super::DEGENERATE_BIN_WIDTH;

/// Returns a sorted copy of `values`.
///
/// Uses IEEE total ordering, so callers should strip `NaN` first.
pub fn sort_values(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolation quantile of an ascending slice.
///
/// `q` is clamped to `[0, 1]`. Returns `NaN` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = (pos.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = pos - lo as f64;

    match (sorted.get(lo), sorted.get(hi)) {
        (Some(&a), Some(&b)) => a + (b - a) * frac,
        _ => f64::NAN,
    }
}

/// Computes bin edges usable for histogramming both `a` and `b`.
///
/// Edges are the `0, 1/k, .., 1` quantiles of the pooled sample with equal
/// values collapsed, so skewed or discrete data ends up with fewer bins.
/// The result always has at least two non-decreasing edges:
///
/// - both samples empty: `[0.0, 1.0]`
/// - a single distinct value `v`: `[v, v + 1e-6]`
pub fn quantile_edges(a: &[f64], b: &[f64], bins: usize) -> Vec<f64> {
    let mut pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    if pooled.is_empty() {
        return vec![0.0, 1.0];
    }
    pooled.sort_by(f64::total_cmp);

    let bins = bins.max(1);
    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| quantile(&pooled, i as f64 / bins as f64))
        .collect();
    edges.dedup();

    if edges.len() < 2 {
        let lo = pooled.first().copied().unwrap_or(0.0);
        let mut hi = pooled.last().copied().unwrap_or(lo);
        if hi <= lo {
            hi = lo + DEGENERATE_BIN_WIDTH;
        }
        edges = vec![lo, hi];
    }
    edges
}

/// Counts `values` per bin.
///
/// Bins are half-open `[e_i, e_{i+1})` except the last, which also includes
/// its right edge. Values outside the edge range (and `NaN`) are not counted.
pub fn histogram_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let n_bins = edges.len().saturating_sub(1);
    let mut counts = vec![0; n_bins];
    let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
        return counts;
    };
    if n_bins == 0 {
        return counts;
    }

    for &v in values {
        if !(v >= first && v <= last) {
            continue;
        }
        let idx = if v >= last {
            n_bins - 1
        } else {
            edges.partition_point(|&e| e <= v).saturating_sub(1)
        };
        if let Some(count) = counts.get_mut(idx) {
            *count += 1;
        }
    }
    counts
}

/// Per-bin probabilities (`count / total`); all zeros when nothing was counted.
pub fn histogram_probs(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let counts = histogram_counts(values, edges);
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .into_iter()
        .map(|c| c as f64 / total as f64)
        .collect()
}
