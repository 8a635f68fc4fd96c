//! Row-level outlier scoring.
//!
//! Every row gets a score in `[0, 1]`; rows at or above the
//! `(1 − contamination)` quantile of all scores are flagged.
//!
//! In [`OutlierMode::Auto`] each numeric column is scored on its own
//! (see [`crate::stats::robust`]) and a row takes its worst column. In
//! [`OutlierMode::Model`] the imputed matrix is handed to a caller-supplied
//! [`MultivariateScorer`].
//!
//! Missing values are mean-imputed on a working copy. A column with no values
//! at all cannot be imputed and is left out of the row score.

mod model;

pub use model::MultivariateScorer;

use crate::config::{OutlierMode, OutlierOptions};
use crate::error::{DriftwatchError, Result};
use crate::metrics::{
    ArtifactKey, ComparisonResult, MetricId, MetricLevel, MetricRecord, MetricTarget,
};
use crate::sink::ArtifactSink;
use crate::snapshot::{ColumnKind, Snapshot};
use crate::stats::{combined_column_score, nan_mean, quantile, sort_values};
use model::model_row_scores;
use ndarray::Array2;
use polars::prelude::*;

/// Everything [`score_outliers`] computed, beyond the metric records.
#[derive(Clone, Debug)]
pub struct OutlierOutcome {
    pub result: ComparisonResult,
    /// One score in `[0, 1]` per snapshot row.
    pub row_scores: Vec<f64>,
    /// Indices of rows scoring at or above `threshold`, ascending.
    pub flagged_rows: Vec<usize>,
    pub threshold: f64,
}

impl OutlierOutcome {
    pub fn rate(&self) -> f64 {
        self.result
            .find(&MetricId::AnomalyRate)
            .and_then(MetricRecord::as_f64)
            .unwrap_or(0.0)
    }
}

/// A selected numeric column after imputation.
struct ScoredColumn {
    name: String,
    /// `None` when every entry was missing.
    values: Option<Vec<f64>>,
}

fn impute_mean(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let mean = nan_mean(&present);
    Some(values.iter().map(|v| v.unwrap_or(mean)).collect())
}

fn select_columns(snapshot: &Snapshot, options: &OutlierOptions) -> Result<Vec<ScoredColumn>> {
    let names = match &options.columns {
        Some(list) => {
            let mut numeric = Vec::with_capacity(list.len());
            for name in list {
                if snapshot.column_kind(name)? == ColumnKind::Numeric {
                    numeric.push(name.clone());
                }
            }
            numeric
        }
        None => snapshot.numeric_column_names(),
    };

    names
        .into_iter()
        .map(|name| {
            let values = impute_mean(&snapshot.numeric_values(&name)?);
            if values.is_none() {
                tracing::warn!(column = %name, "Column has no values; excluded from row scores");
            }
            Ok(ScoredColumn { name, values })
        })
        .collect()
}

fn outcome_meta(result: &mut ComparisonResult, snapshot: &Snapshot, columns: &[ScoredColumn]) {
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    result
        .meta
        .insert("dataset".to_owned(), snapshot.name().into());
    result.meta.insert("columns".to_owned(), names.into());
    result.meta.insert("n".to_owned(), snapshot.height().into());
}

fn zero_rate(snapshot: &Snapshot, options: &OutlierOptions, columns: &[ScoredColumn]) -> OutlierOutcome {
    let mut result = ComparisonResult::new();
    result.push(
        MetricRecord::new(MetricId::AnomalyRate, MetricLevel::Dataset, MetricTarget::All, 0.0)
            .with_unit("fraction"),
    );
    outcome_meta(&mut result, snapshot, columns);
    result
        .meta
        .insert("method".to_owned(), options.mode.as_str().into());
    OutlierOutcome {
        result,
        row_scores: vec![0.0; snapshot.height()],
        flagged_rows: Vec::new(),
        threshold: 1.0,
    }
}

/// Worst column score per row, plus each column's full score vector.
fn auto_row_scores(columns: &[ScoredColumn], n: usize) -> (Vec<f64>, Vec<Option<Vec<f64>>>) {
    let per_column: Vec<Option<Vec<f64>>> = columns
        .iter()
        .map(|c| c.values.as_deref().map(combined_column_score))
        .collect();

    let mut rows = vec![0.0_f64; n];
    for scores in per_column.iter().flatten() {
        for (row, s) in rows.iter_mut().zip(scores) {
            *row = row.max(*s);
        }
    }
    (rows, per_column)
}

fn feature_matrix(columns: &[&Vec<f64>], n: usize) -> Array2<f64> {
    let mut x = Array2::zeros((n, columns.len()));
    for (mut target, values) in x.columns_mut().into_iter().zip(columns) {
        for (cell, v) in target.iter_mut().zip(values.iter()) {
            *cell = *v;
        }
    }
    x
}

/// `(1 − contamination)` quantile of the scores; `1.0` for a single row.
pub fn threshold_for(scores: &[f64], contamination: f64) -> f64 {
    if scores.len() > 1 {
        quantile(&sort_values(scores), 1.0 - contamination)
    } else {
        1.0
    }
}

fn flagged_table(
    snapshot: &Snapshot,
    options: &OutlierOptions,
    row_scores: &[f64],
    flagged_rows: &[usize],
) -> Result<DataFrame> {
    let base = match &options.columns {
        Some(list) => snapshot.frame().select(list.iter().map(String::as_str))?,
        None => snapshot.frame().clone(),
    };
    let mask: Vec<bool> = (0..row_scores.len())
        .map(|i| flagged_rows.binary_search(&i).is_ok())
        .collect();
    let mask = BooleanChunked::from_slice("flagged".into(), &mask);

    let mut out = base.filter(&mask)?;
    let index: Vec<u64> = flagged_rows.iter().map(|&i| i as u64).collect();
    let scores: Vec<f64> = flagged_rows
        .iter()
        .filter_map(|&i| row_scores.get(i).copied())
        .collect();
    out.with_column(Column::from(Series::new("row_index".into(), index)))?;
    out.with_column(Column::from(Series::new("anomaly_score".into(), scores)))?;
    Ok(out)
}

/// Scores every row of `snapshot` for outlierness.
///
/// `model` is only consulted in [`OutlierMode::Model`]. When a sink is given
/// and at least one row is flagged, the flagged rows are persisted as
/// `<snapshot>__anomalies` under `artifact.anomaly.rows`.
///
/// # Errors
///
/// - [`DriftwatchError::Config`] for invalid options, or model mode without a model
/// - [`DriftwatchError::Model`] when the model fails or returns unusable scores
/// - data errors for an explicitly requested column that does not exist
pub fn score_outliers(
    snapshot: &Snapshot,
    options: &OutlierOptions,
    model: Option<&mut dyn MultivariateScorer>,
    sink: Option<&mut dyn ArtifactSink>,
) -> Result<OutlierOutcome> {
    options.validate()?;
    let model = match (options.mode, model) {
        (OutlierMode::Model, None) => {
            return Err(DriftwatchError::Config(
                "model mode requested but no multivariate scorer is configured".to_owned(),
            ));
        }
        (OutlierMode::Model, Some(m)) => Some(m),
        (OutlierMode::Auto, _) => None,
    };

    let columns = select_columns(snapshot, options)?;
    let n = snapshot.height();
    tracing::info!(
        dataset = snapshot.name(),
        rows = n,
        columns = columns.len(),
        mode = options.mode.as_str(),
        "Scoring outliers"
    );

    let usable: Vec<&Vec<f64>> = columns.iter().filter_map(|c| c.values.as_ref()).collect();
    if n == 0 || usable.is_empty() {
        tracing::info!(dataset = snapshot.name(), "Nothing to score");
        return Ok(zero_rate(snapshot, options, &columns));
    }

    let (row_scores, column_scores) = match model {
        Some(model) => (model_row_scores(model, &feature_matrix(&usable, n))?, None),
        None => {
            let (rows, per_column) = auto_row_scores(&columns, n);
            (rows, Some(per_column))
        }
    };

    let threshold = threshold_for(&row_scores, options.contamination);
    let flagged_rows: Vec<usize> = row_scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s >= threshold)
        .map(|(i, _)| i)
        .collect();
    let rate = flagged_rows.len() as f64 / n as f64;

    let mut result = ComparisonResult::new();
    result.push(
        MetricRecord::new(MetricId::AnomalyRate, MetricLevel::Dataset, MetricTarget::All, rate)
            .with_unit("fraction")
            .with_meta("flagged", flagged_rows.len())
            .with_meta("contamination", options.contamination),
    );
    result.push(MetricRecord::new(
        MetricId::AnomalyThreshold,
        MetricLevel::Dataset,
        MetricTarget::All,
        threshold,
    ));

    if let Some(per_column) = column_scores {
        for (column, scores) in columns.iter().zip(per_column) {
            let mean = scores.map_or(f64::NAN, |s| nan_mean(&s));
            tracing::debug!(column = %column.name, mean, "Column outlier score");
            result.push(MetricRecord::new(
                MetricId::AnomalyColumnScore {
                    column: column.name.clone(),
                },
                MetricLevel::Column,
                MetricTarget::Column(column.name.clone()),
                mean,
            ));
        }
    }

    if let Some(sink) = sink
        && !flagged_rows.is_empty()
    {
        let table = flagged_table(snapshot, options, &row_scores, &flagged_rows)?;
        let location = sink.persist(&table, &format!("{}__anomalies", snapshot.name()))?;
        result
            .artifacts
            .insert(ArtifactKey::AnomalyRows.to_string(), location);
    }

    outcome_meta(&mut result, snapshot, &columns);
    result
        .meta
        .insert("method".to_owned(), options.mode.as_str().into());
    tracing::info!(
        dataset = snapshot.name(),
        rate,
        threshold,
        flagged = flagged_rows.len(),
        "Outlier scoring complete"
    );

    Ok(OutlierOutcome {
        result,
        row_scores,
        flagged_rows,
        threshold,
    })
}
