use crate::error::{DriftwatchError, Result};
use crate::stats::DENOM_EPSILON;
use ndarray::{Array1, Array2};

/// A multivariate row scorer supplied by the caller.
///
/// The contract is two-step: [`fit`](Self::fit) on the imputed feature
/// matrix (rows × selected columns), then [`score`](Self::score) the same
/// matrix. Higher scores mean *more normal*. Seeding and thread-safety are the
/// implementation's business.
pub trait MultivariateScorer {
    /// # Errors
    ///
    /// Implementations should return [`DriftwatchError::Model`] on failure.
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// One score per row of `x`.
    ///
    /// # Errors
    ///
    /// Implementations should return [`DriftwatchError::Model`] on failure.
    fn score(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Fits, scores and converts "normality" into anomaly scores in `[0, 1]`.
pub(super) fn model_row_scores(
    model: &mut dyn MultivariateScorer,
    x: &Array2<f64>,
) -> Result<Vec<f64>> {
    model.fit(x)?;
    let raw = model.score(x)?;

    if raw.len() != x.nrows() {
        return Err(DriftwatchError::Model(format!(
            "scorer returned {} scores for {} rows",
            raw.len(),
            x.nrows()
        )));
    }
    if let Some(bad) = raw.iter().position(|v| !v.is_finite()) {
        return Err(DriftwatchError::Model(format!(
            "scorer returned a non-finite score at row {bad}"
        )));
    }

    Ok(normalize_inverted(&raw))
}

/// `(s − min) / (max − min + ε)` of the negated scores.
fn normalize_inverted(raw: &Array1<f64>) -> Vec<f64> {
    let negated: Vec<f64> = raw.iter().map(|v| -v).collect();
    let min = negated.iter().copied().fold(f64::INFINITY, f64::min);
    let max = negated.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min + DENOM_EPSILON;
    negated.into_iter().map(|v| (v - min) / range).collect()
}
