//! Feature-wise comparison of a candidate snapshot against a reference.
//!
//! For every requested feature:
//!
//! - numeric in both snapshots: PSI over shared quantile bins and/or KS
//! - anything else: categorical PSI (KS is skipped silently)
//!
//! One record is emitted per (statistic, feature) pair under
//! `dq.represent.<stat>.<feature>`, followed by `dq.represent.psi.aggregate`,
//! the mean of the PSI values that are not `NaN`. The aggregate is omitted
//! when no PSI was computed at all.

use crate::config::ComparisonOptions;
use crate::error::Result;
use crate::metrics::{
    ArtifactKey, ComparisonResult, MetricId, MetricLevel, MetricRecord, MetricTarget, Namespace,
    Statistic,
};
use crate::sink::ArtifactSink;
use crate::snapshot::{ColumnData, Snapshot};
use crate::stats::{ks_numeric, nan_mean, psi_categorical, psi_numeric};
use polars::prelude::*;

/// Features to compare: the explicit list, or every column present in both.
pub fn resolve_features(
    candidate: &Snapshot,
    reference: &Snapshot,
    features: Option<&[String]>,
) -> Vec<String> {
    match features {
        Some(list) => list.to_vec(),
        None => candidate
            .column_names()
            .into_iter()
            .filter(|c| reference.has_column(c))
            .collect(),
    }
}

fn column_record(statistic: Statistic, feature: &str, value: f64) -> MetricRecord {
    if value.is_nan() {
        tracing::warn!(%statistic, feature, "Degenerate input; statistic is NaN");
    } else {
        tracing::debug!(%statistic, feature, value, "Computed statistic");
    }
    MetricRecord::new(
        MetricId::column(Namespace::Represent, statistic, feature),
        MetricLevel::Column,
        MetricTarget::Column(feature.to_owned()),
        value,
    )
}

fn edges_table(edges: &[f64]) -> Result<DataFrame> {
    let s = Series::new("edge".into(), edges.to_vec());
    Ok(DataFrame::new(vec![Column::from(s)])?)
}

/// Compares `candidate` against `reference`.
///
/// When a sink is supplied, the bin edges behind every numeric PSI are
/// persisted as `<feature>_bins` and recorded under
/// `artifact.represent.<feature>.bins`.
///
/// # Errors
///
/// Returns error if the options are invalid, an explicitly requested feature
/// is missing from either snapshot, or the sink fails. Degenerate data never
/// errors; the affected statistic is `NaN`.
pub fn compare(
    candidate: &Snapshot,
    reference: &Snapshot,
    options: &ComparisonOptions,
    mut sink: Option<&mut dyn ArtifactSink>,
) -> Result<ComparisonResult> {
    options.validate()?;
    let features = resolve_features(candidate, reference, options.features.as_deref());
    tracing::info!(
        candidate = candidate.name(),
        reference = reference.name(),
        features = features.len(),
        "Comparing snapshots"
    );

    let mut result = ComparisonResult::new();
    let mut psi_values = Vec::new();

    for feature in &features {
        let a = candidate.column(feature)?;
        let b = reference.column(feature)?;

        if let (ColumnData::Numeric(_), ColumnData::Numeric(_)) = (&a, &b) {
            let (xa, xb) = (a.present_numbers(), b.present_numbers());

            if options.wants(Statistic::Psi) {
                let psi = psi_numeric(&xa, &xb, options.bins);
                psi_values.push(psi.value);
                result.push(
                    column_record(Statistic::Psi, feature, psi.value)
                        .with_meta("kind", "numeric")
                        .with_meta("bins", options.bins)
                        .with_meta("edges", psi.edges.len()),
                );

                if let Some(sink) = sink.as_deref_mut() {
                    let table = edges_table(&psi.edges)?;
                    let location = sink.persist(&table, &format!("{feature}_bins"))?;
                    result.artifacts.insert(
                        ArtifactKey::BinEdges {
                            column: feature.clone(),
                        }
                        .to_string(),
                        location,
                    );
                }
            }

            if options.wants(Statistic::Ks) {
                result.push(
                    column_record(Statistic::Ks, feature, ks_numeric(&xa, &xb))
                        .with_meta("kind", "numeric"),
                );
            }
        } else if options.wants(Statistic::Psi) {
            let psi = psi_categorical(&a.present_categories(), &b.present_categories());
            psi_values.push(psi);
            result.push(column_record(Statistic::Psi, feature, psi).with_meta("kind", "categorical"));
        }
    }

    if !psi_values.is_empty() {
        let mean = nan_mean(&psi_values);
        result.push(
            MetricRecord::new(
                MetricId::Aggregate {
                    namespace: Namespace::Represent,
                    statistic: Statistic::Psi,
                },
                MetricLevel::Dataset,
                MetricTarget::Columns(features.clone()),
                mean,
            )
            .with_meta("features", psi_values.len()),
        );
        tracing::info!(aggregate_psi = mean, "Comparison complete");
    }

    result.meta.insert("left".to_owned(), candidate.name().into());
    result.meta.insert("right".to_owned(), reference.name().into());
    result
        .meta
        .insert("left_fingerprint".to_owned(), candidate.fingerprint().into());
    result
        .meta
        .insert("right_fingerprint".to_owned(), reference.fingerprint().into());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use anyhow::Result;

    fn numeric(name: &str, column: &str, values: Vec<f64>) -> Result<Snapshot> {
        let s = Series::new(column.into(), values);
        Ok(Snapshot::from_columns(name, vec![Column::from(s)])?)
    }

    fn arange(offset: f64) -> Vec<f64> {
        (0..100).map(|i| f64::from(i) + offset).collect()
    }

    #[test]
    fn test_identical_numeric() -> Result<()> {
        let a = numeric("A", "x", arange(0.0))?;
        let b = numeric("B", "x", arange(0.0))?;
        let mut sink = MemorySink::new();

        let rep = compare(&a, &b, &ComparisonOptions::default(), Some(&mut sink))?;

        let psi = rep.value("dq.represent.psi.x").unwrap_or(f64::NAN);
        assert!(psi.abs() < 1e-9, "PSI of identical samples, got {psi}");
        assert_eq!(rep.value("dq.represent.ks.x"), Some(0.0));
        assert!(rep.artifacts.contains_key("artifact.represent.x.bins"));
        assert_eq!(sink.get("x_bins").map(DataFrame::height), Some(11));
        Ok(())
    }

    #[test]
    fn test_shifted_numeric() -> Result<()> {
        let a = numeric("A", "x", arange(0.0))?;
        let b = numeric("B", "x", arange(10.0))?;
        let rep = compare(&a, &b, &ComparisonOptions::default(), None)?;

        assert!(rep.value("dq.represent.psi.x").is_some_and(|v| v > 0.0));
        assert!(rep.value("dq.represent.ks.x").is_some_and(|v| v > 0.0));
        assert!(rep.artifacts.is_empty(), "No sink, no artifacts");
        Ok(())
    }

    #[test]
    fn test_categorical_psi_and_no_ks() -> Result<()> {
        let a = Snapshot::from_columns(
            "A",
            vec![Column::from(Series::new("c".into(), vec!["a", "a", "b", "b", "b"]))],
        )?;
        let b = Snapshot::from_columns(
            "B",
            vec![Column::from(Series::new("c".into(), vec!["a", "a", "a", "b", "b"]))],
        )?;
        let rep = compare(&a, &b, &ComparisonOptions::default(), None)?;

        let psi = rep.value("dq.represent.psi.c").unwrap_or(f64::NAN);
        assert!((psi - 0.162).abs() < 1e-3, "Expected ~0.162, got {psi}");
        assert!(rep.get("dq.represent.ks.c").is_none());
        Ok(())
    }

    #[test]
    fn test_aggregate_ignores_nan() -> Result<()> {
        let x = Series::new("x".into(), vec![1.0, 2.0, 3.0]);
        let empty = Series::new("e".into(), vec![None::<&str>, None, None]);
        let a = Snapshot::from_columns("A", vec![Column::from(x.clone()), Column::from(empty.clone())])?;
        let b = Snapshot::from_columns("B", vec![Column::from(x), Column::from(empty)])?;

        let rep = compare(&a, &b, &ComparisonOptions::default(), None)?;
        assert!(rep.value("dq.represent.psi.e").is_some_and(f64::is_nan));
        let agg = rep.value("dq.represent.psi.aggregate").unwrap_or(f64::NAN);
        assert!(agg.abs() < 1e-12, "NaN PSI should be ignored, got {agg}");
        Ok(())
    }

    #[test]
    fn test_no_psi_means_no_aggregate() -> Result<()> {
        let a = numeric("A", "x", arange(0.0))?;
        let opts = ComparisonOptions::default().with_statistics([Statistic::Ks]);
        let rep = compare(&a, &a, &opts, None)?;
        assert!(rep.get("dq.represent.psi.aggregate").is_none());
        assert_eq!(rep.len(), 1);
        Ok(())
    }

    #[test]
    fn test_features_default_to_shared_columns() -> Result<()> {
        let a = Snapshot::from_columns(
            "A",
            vec![
                Column::from(Series::new("x".into(), vec![1.0, 2.0])),
                Column::from(Series::new("only_a".into(), vec![1.0, 2.0])),
            ],
        )?;
        let b = numeric("B", "x", vec![1.0, 3.0])?;
        assert_eq!(resolve_features(&a, &b, None), vec!["x"]);

        let rep = compare(&a, &b, &ComparisonOptions::default(), None)?;
        assert_eq!(rep.meta.get("left"), Some(&"A".into()));
        assert!(rep.get("dq.represent.psi.only_a").is_none());
        Ok(())
    }

    #[test]
    fn test_explicit_missing_feature_is_an_error() -> Result<()> {
        let a = numeric("A", "x", arange(0.0))?;
        let opts = ComparisonOptions::default().with_features(["y"]);
        assert!(compare(&a, &a, &opts, None).is_err());
        Ok(())
    }

    #[test]
    fn test_mixed_kinds_fall_back_to_categorical() -> Result<()> {
        let a = numeric("A", "v", vec![1.0, 2.0, 2.0])?;
        let b = Snapshot::from_columns(
            "B",
            vec![Column::from(Series::new("v".into(), vec!["1", "2", "2"]))],
        )?;
        let rep = compare(&a, &b, &ComparisonOptions::default(), None)?;
        let psi = rep.get("dq.represent.psi.v");
        assert!(psi.is_some_and(|r| r.metadata.get("kind") == Some(&"categorical".into())));
        assert!(rep.get("dq.represent.ks.v").is_none());
        Ok(())
    }
}
