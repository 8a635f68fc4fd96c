//! Divergence statistics between two samples.

use super::PSI_EPSILON;
use super::binning::{histogram_probs, quantile_edges, sort_values};
use std::collections::{BTreeMap, BTreeSet};

/// PSI of a numeric column together with the edges it was binned on.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericPsi {
    pub value: f64,
    pub edges: Vec<f64>,
}

/// `Σ (pa − pb) · ln(pa / pb)` with exact zeros replaced by [`PSI_EPSILON`].
///
/// The vectors are paired by position; extra trailing entries are ignored.
pub fn psi_from_probs(pa: &[f64], pb: &[f64]) -> f64 {
    let floor = |p: f64| if p == 0.0 { PSI_EPSILON } else { p };
    pa.iter()
        .zip(pb)
        .map(|(&a, &b)| {
            let (a, b) = (floor(a), floor(b));
            (a - b) * (a / b).ln()
        })
        .sum()
}

/// PSI over shared quantile bins (see [`quantile_edges`]).
pub fn psi_numeric(a: &[f64], b: &[f64], bins: usize) -> NumericPsi {
    let edges = quantile_edges(a, b, bins);
    let pa = histogram_probs(a, &edges);
    let pb = histogram_probs(b, &edges);
    NumericPsi {
        value: psi_from_probs(&pa, &pb),
        edges,
    }
}

fn category_frequencies<S: AsRef<str>>(values: &[S]) -> BTreeMap<&str, usize> {
    let mut freq = BTreeMap::new();
    for v in values {
        *freq.entry(v.as_ref()).or_insert(0) += 1;
    }
    freq
}

fn category_probs(
    categories: &BTreeSet<&str>,
    freq: &BTreeMap<&str, usize>,
    total: usize,
) -> Vec<f64> {
    categories
        .iter()
        .map(|&c| match freq.get(c) {
            Some(&n) if total > 0 => n as f64 / total as f64,
            _ => 0.0,
        })
        .collect()
}

/// PSI over the union of categories seen in either sample.
///
/// Each sample is normalised by its own size; a category missing from one
/// sample gets probability zero there. Returns `NaN` when neither sample has
/// any category.
pub fn psi_categorical<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let freq_a = category_frequencies(a);
    let freq_b = category_frequencies(b);
    let categories: BTreeSet<&str> = freq_a.keys().chain(freq_b.keys()).copied().collect();
    if categories.is_empty() {
        return f64::NAN;
    }

    psi_from_probs(
        &category_probs(&categories, &freq_a, a.len()),
        &category_probs(&categories, &freq_b, b.len()),
    )
}

/// Two-sample Kolmogorov–Smirnov distance.
///
/// Both empirical CDFs are evaluated at every distinct value of the pooled
/// sample; the result is the largest absolute gap. Returns `NaN` if either
/// sample is empty.
pub fn ks_numeric(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::NAN;
    }
    let sa = sort_values(a);
    let sb = sort_values(b);

    let mut grid: Vec<f64> = sa.iter().chain(&sb).copied().collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();

    let ecdf = |sorted: &[f64], x: f64| sorted.partition_point(|&v| v <= x) as f64 / sorted.len() as f64;

    grid.into_iter()
        .map(|x| (ecdf(&sa, x) - ecdf(&sb, x)).abs())
        .fold(0.0, f64::max)
}
