//! Settings and per-call options.
//!
//! [`MonitorSettings`] is the serializable form a host application keeps on
//! disk (pretty JSON). Each engine call takes a small options struct that can
//! be derived from the settings or built directly.
//!
//! ```
//! use driftwatch::config::{ComparisonOptions, MonitorSettings};
//! use driftwatch::metrics::Statistic;
//!
//! let settings = MonitorSettings::default();
//! assert_eq!(settings.bins, 10);
//!
//! let opts = ComparisonOptions::default()
//!     .with_features(["age", "fare"])
//!     .with_statistics([Statistic::Psi]);
//! assert!(!opts.wants(Statistic::Ks));
//! ```

use crate::error::{DriftwatchError, Result, ResultExt as _};
use crate::metrics::Statistic;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BINS: usize = 10;
pub const DEFAULT_CONTAMINATION: f64 = 0.01;

/// How rows are scored for outlierness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMode {
    /// Robust z / IQR fence per column, worst column wins.
    #[default]
    Auto,
    /// Delegate to a caller-supplied multivariate scorer.
    Model,
}

impl OutlierMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    /// Requested quantile bin count for numeric PSI
    pub bins: usize,
    /// Statistics computed by pairwise comparison and drift
    pub statistics: Vec<Statistic>,
    /// Statistics computed at each history step
    pub history_statistics: Vec<Statistic>,
    /// Columns to compare; `None` means every shared column
    pub features: Option<Vec<String>>,
    /// Expected anomalous fraction, in (0, 1]
    pub contamination: f64,
    pub outlier_mode: OutlierMode,
    /// Columns to score; `None` means every numeric column
    pub outlier_columns: Option<Vec<String>>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            statistics: vec![Statistic::Psi, Statistic::Ks],
            history_statistics: vec![Statistic::Psi],
            features: None,
            contamination: DEFAULT_CONTAMINATION,
            outlier_mode: OutlierMode::Auto,
            outlier_columns: None,
        }
    }
}

impl MonitorSettings {
    /// # Errors
    ///
    /// Returns [`DriftwatchError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.comparison_options().validate()?;
        self.history_options().comparison().validate()?;
        self.outlier_options().validate()
    }

    pub fn comparison_options(&self) -> ComparisonOptions {
        ComparisonOptions {
            features: self.features.clone(),
            statistics: self.statistics.clone(),
            bins: self.bins,
        }
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            features: self.features.clone(),
            statistics: self.history_statistics.clone(),
            bins: self.bins,
        }
    }

    pub fn outlier_options(&self) -> OutlierOptions {
        OutlierOptions {
            columns: self.outlier_columns.clone(),
            mode: self.outlier_mode,
            contamination: self.contamination,
        }
    }
}

/// Reads and validates settings from a JSON file.
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid JSON, or fails validation.
pub fn load_settings(path: &Path) -> Result<MonitorSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;
    let settings: MonitorSettings = serde_json::from_str(&content)?;
    settings.validate()?;
    Ok(settings)
}

/// Writes settings as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns error if the directory or file cannot be written.
pub fn save_settings(path: &Path, settings: &MonitorSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Options for a pairwise comparison (and drift measurement).
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOptions {
    pub features: Option<Vec<String>>,
    pub statistics: Vec<Statistic>,
    pub bins: usize,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            features: None,
            statistics: vec![Statistic::Psi, Statistic::Ks],
            bins: DEFAULT_BINS,
        }
    }
}

impl ComparisonOptions {
    #[must_use]
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_statistics(mut self, statistics: impl IntoIterator<Item = Statistic>) -> Self {
        self.statistics = statistics.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn wants(&self, statistic: Statistic) -> bool {
        self.statistics.contains(&statistic)
    }

    /// # Errors
    ///
    /// Returns [`DriftwatchError::Config`] for a zero bin count or an empty
    /// statistic list.
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            return Err(DriftwatchError::Config(
                "bin count must be at least 1".to_owned(),
            ));
        }
        if self.statistics.is_empty() {
            return Err(DriftwatchError::Config(
                "at least one statistic must be requested".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Options for tracking drift over an ordered snapshot history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryOptions {
    pub features: Option<Vec<String>>,
    pub statistics: Vec<Statistic>,
    pub bins: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            features: None,
            statistics: vec![Statistic::Psi],
            bins: DEFAULT_BINS,
        }
    }
}

impl HistoryOptions {
    /// Options used for each consecutive pair.
    pub fn comparison(&self) -> ComparisonOptions {
        ComparisonOptions {
            features: self.features.clone(),
            statistics: self.statistics.clone(),
            bins: self.bins,
        }
    }
}

/// Options for row-level outlier scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierOptions {
    pub columns: Option<Vec<String>>,
    pub mode: OutlierMode,
    pub contamination: f64,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        Self {
            columns: None,
            mode: OutlierMode::Auto,
            contamination: DEFAULT_CONTAMINATION,
        }
    }
}

impl OutlierOptions {
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: OutlierMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    /// # Errors
    ///
    /// Returns [`DriftwatchError::Config`] if contamination is outside (0, 1].
    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 1.0) {
            return Err(DriftwatchError::Config(format!(
                "contamination must be in (0, 1], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}
