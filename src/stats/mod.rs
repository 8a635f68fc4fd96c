//! Leaf numerics shared by the comparison and anomaly engines.
//!
//! - [`binning`]: shared quantile bin edges and histogram probabilities
//! - [`distance`]: population stability index and Kolmogorov–Smirnov distance
//! - [`robust`]: median/MAD/IQR based per-value outlier scores
//! - [`aggregate`]: NaN-aware means and trends across columns or steps
//!
//! Every function here is pure and works on plain `f64` slices with missing
//! entries already removed (or imputed). None of them return errors; degenerate
//! inputs yield `NaN` or a documented fallback instead.

pub mod aggregate;
pub mod binning;
pub mod distance;
pub mod robust;

pub use aggregate::{nan_mean, trend};
pub use binning::{histogram_counts, histogram_probs, quantile, quantile_edges, sort_values};
pub use distance::{NumericPsi, ks_numeric, psi_categorical, psi_from_probs, psi_numeric};
pub use robust::{combined_column_score, iqr_score, median, robust_z, sigmoid};

/// Probability substituted for empty bins/categories before the PSI log ratio.
pub const PSI_EPSILON: f64 = 1e-6;

/// Width of the single bin used when both samples hold one distinct value.
pub const DEGENERATE_BIN_WIDTH: f64 = 1e-6;

/// Added to near-zero denominators (standard deviation, IQR, score range).
pub const DENOM_EPSILON: f64 = 1e-12;

/// Robust-z value that maps to 0.5 after squashing.
pub const SIGMOID_CUTOFF: f64 = 3.0;

/// Scales the MAD into a standard-deviation estimate under normality.
pub const MAD_SCALE: f64 = 1.4826;

/// Tukey fence multiplier.
pub const IQR_FENCE: f64 = 1.5;
